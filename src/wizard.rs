use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::clock;
use crate::config::{self, ScheduleConfig, ServiceOption};
use crate::engine::{find_nearest_available_date, generate_slots, lookahead_dates};
use crate::error::{StoreError, WizardError};
use crate::model::{Booking, BookingDraft, Minutes};
use crate::observability;
use crate::store::BookingStore;

/// Per-call budget for store I/O.
const STORE_TIMEOUT: Duration = Duration::from_secs(5);
/// Additional attempts after the first on a transient store failure.
const STORE_RETRIES: u32 = 2;

/// Steps of the booking flow, in order of appearance. `ManageExisting` is
/// the branch taken when the phone number has future bookings attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    CollectContact,
    ManageExisting,
    ChooseService,
    ChooseSlot,
    Confirm,
    Completed,
}

impl WizardStep {
    pub fn name(self) -> &'static str {
        match self {
            WizardStep::CollectContact => "collect_contact",
            WizardStep::ManageExisting => "manage_existing",
            WizardStep::ChooseService => "choose_service",
            WizardStep::ChooseSlot => "choose_slot",
            WizardStep::Confirm => "confirm",
            WizardStep::Completed => "completed",
        }
    }
}

/// What the slot step has to show for one day. An empty `slots` with
/// `alternative: None` means "no online availability, contact us" — that is
/// data, not an error, and the flow can go back to service selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<Minutes>,
    /// Nearest later day with capacity, offered when `slots` is empty.
    pub alternative: Option<NaiveDate>,
}

/// One customer's pass through the booking flow. Created when the widget
/// opens, discarded when it closes; nothing here is persisted except the
/// final booking at confirmation.
pub struct WizardSession {
    store: Arc<dyn BookingStore>,
    config: ScheduleConfig,
    catalog: &'static [ServiceOption],
    step: WizardStep,
    draft: BookingDraft,
    existing: Vec<Booking>,
    availability: Option<DayAvailability>,
}

impl WizardSession {
    pub fn new(store: Arc<dyn BookingStore>, config: ScheduleConfig) -> Self {
        Self {
            store,
            config,
            catalog: config::default_catalog(),
            step: WizardStep::CollectContact,
            draft: BookingDraft::default(),
            existing: Vec::new(),
            availability: None,
        }
    }

    pub fn with_catalog(mut self, catalog: &'static [ServiceOption]) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// The customer's other future bookings, populated at the contact step.
    pub fn existing_bookings(&self) -> &[Booking] {
        &self.existing
    }

    /// Availability for the currently selected date, once in `ChooseSlot`.
    pub fn availability(&self) -> Option<&DayAvailability> {
        self.availability.as_ref()
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::StepMismatch {
                expected: expected.name(),
                got: self.step.name(),
            })
        }
    }

    // ── CollectContact ──────────────────────────────────────────

    /// Record the phone number and look up the customer's future bookings.
    /// Any found → `ManageExisting`, none → `ChooseService`.
    pub async fn submit_phone(&mut self, phone: &str) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::CollectContact)?;
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(WizardError::Validation("phone"));
        }
        self.draft.customer_phone = phone.to_string();

        let today = clock::civil_today(self.config.timezone);
        let store = self.store.clone();
        let phone = phone.to_string();
        let found = with_store_retry("list_future_bookings_for_phone", || {
            store.list_future_bookings_for_phone(&phone, today)
        })
        .await?;

        self.step = if found.is_empty() {
            WizardStep::ChooseService
        } else {
            WizardStep::ManageExisting
        };
        info!(existing = found.len(), step = self.step.name(), "contact step complete");
        self.existing = found;
        Ok(self.step)
    }

    // ── ManageExisting ──────────────────────────────────────────

    /// Copy the selected booking (including its id) into the draft and move
    /// on to service selection. The id makes the final persist an update.
    pub fn select_existing(&mut self, id: Ulid) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::ManageExisting)?;
        let booking = self
            .existing
            .iter()
            .find(|b| b.id == id)
            .ok_or(WizardError::NotFound(id))?;
        self.draft = BookingDraft::from_existing(booking);
        self.step = WizardStep::ChooseService;
        info!(booking = %id, "editing existing booking");
        Ok(self.step)
    }

    /// Delete the selected booking. When the last one goes, continue to
    /// service selection with a fresh draft (phone retained).
    pub async fn cancel_existing(&mut self, id: Ulid) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::ManageExisting)?;
        if !self.existing.iter().any(|b| b.id == id) {
            return Err(WizardError::NotFound(id));
        }
        let store = self.store.clone();
        with_store_retry("delete_booking", || store.delete_booking(id)).await?;
        self.existing.retain(|b| b.id != id);
        metrics::counter!(observability::BOOKINGS_CANCELLED_TOTAL).increment(1);
        info!(booking = %id, remaining = self.existing.len(), "booking cancelled");

        if self.existing.is_empty() {
            self.draft = BookingDraft {
                customer_phone: std::mem::take(&mut self.draft.customer_phone),
                ..BookingDraft::default()
            };
            self.step = WizardStep::ChooseService;
        }
        Ok(self.step)
    }

    /// Keep the existing bookings and book something new instead.
    pub fn start_new(&mut self) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::ManageExisting)?;
        self.draft.id = None;
        self.step = WizardStep::ChooseService;
        Ok(self.step)
    }

    // ── ChooseService ───────────────────────────────────────────

    pub fn choose_service(&mut self, service_id: &str) -> Result<(), WizardError> {
        self.expect_step(WizardStep::ChooseService)?;
        let service = self
            .catalog
            .iter()
            .find(|s| s.id == service_id)
            .ok_or(WizardError::Validation("service"))?;
        self.draft.service_id = Some(service.id.to_string());
        self.draft.service_label = service.label.to_string();
        self.draft.duration_minutes = Some(service.duration_minutes);
        Ok(())
    }

    pub fn choose_radius(&mut self, radius: &str) -> Result<(), WizardError> {
        self.expect_step(WizardStep::ChooseService)?;
        if !config::is_known_radius(radius) {
            return Err(WizardError::Validation("radius"));
        }
        self.draft.radius = Some(radius.to_string());
        Ok(())
    }

    /// Enter the slot step. Requires service and radius; computes
    /// availability for the draft's date (default: today).
    pub async fn advance_to_slots(&mut self) -> Result<DayAvailability, WizardError> {
        self.expect_step(WizardStep::ChooseService)?;
        if self.draft.service_id.is_none() {
            return Err(WizardError::Validation("service"));
        }
        if self.draft.radius.is_none() {
            return Err(WizardError::Validation("radius"));
        }
        self.step = WizardStep::ChooseSlot;
        let date = self
            .draft
            .booking_date
            .unwrap_or_else(|| clock::civil_today(self.config.timezone));
        self.refresh_availability(date).await
    }

    // ── ChooseSlot ──────────────────────────────────────────────

    /// Switch to another day; clears any previously chosen time.
    pub async fn select_date(&mut self, date: NaiveDate) -> Result<DayAvailability, WizardError> {
        self.expect_step(WizardStep::ChooseSlot)?;
        self.draft.start_time = None;
        self.refresh_availability(date).await
    }

    /// Jump to the alternative date the availability search offered.
    pub async fn accept_alternative(&mut self) -> Result<DayAvailability, WizardError> {
        self.expect_step(WizardStep::ChooseSlot)?;
        let alternative = self
            .availability
            .as_ref()
            .and_then(|a| a.alternative)
            .ok_or(WizardError::Validation("slot"))?;
        self.draft.start_time = None;
        self.refresh_availability(alternative).await
    }

    /// Pick one of the offered start times.
    pub fn select_time(&mut self, start: Minutes) -> Result<(), WizardError> {
        self.expect_step(WizardStep::ChooseSlot)?;
        let offered = self
            .availability
            .as_ref()
            .is_some_and(|a| a.slots.contains(&start));
        if !offered {
            return Err(WizardError::Validation("slot"));
        }
        self.draft.start_time = Some(start);
        Ok(())
    }

    pub fn advance_to_confirm(&mut self) -> Result<WizardStep, WizardError> {
        self.expect_step(WizardStep::ChooseSlot)?;
        if self.draft.start_time.is_none() {
            return Err(WizardError::Validation("slot"));
        }
        self.step = WizardStep::Confirm;
        Ok(self.step)
    }

    // ── Confirm ─────────────────────────────────────────────────

    /// Record the customer name and persist the draft: insert when it has no
    /// id, update when it does. On success the session completes. A
    /// persistence failure keeps the session in `Confirm` with the draft
    /// intact; a slot-taken rejection sends it back to `ChooseSlot` with
    /// availability recomputed.
    pub async fn confirm(&mut self, name: &str) -> Result<Booking, WizardError> {
        self.expect_step(WizardStep::Confirm)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(WizardError::Validation("name"));
        }
        self.draft.customer_name = name.to_string();

        let editing = self.draft.id;
        let payload = self.draft.payload()?;
        let store = self.store.clone();
        let result = match editing {
            Some(id) => {
                with_store_retry("update_booking", || store.update_booking(id, payload.clone()))
                    .await
            }
            None => {
                with_store_retry("create_booking", || store.create_booking(payload.clone())).await
            }
        };

        match result {
            Ok(booking) => {
                if editing.is_some() {
                    metrics::counter!(observability::BOOKINGS_UPDATED_TOTAL).increment(1);
                } else {
                    metrics::counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
                }
                info!(booking = %booking.id, edited = booking.is_edited, "booking persisted");
                self.step = WizardStep::Completed;
                Ok(booking)
            }
            Err(WizardError::SlotTaken { date, start_minute }) => {
                metrics::counter!(observability::WRITE_CONFLICTS_TOTAL).increment(1);
                warn!(%date, start_minute, "slot taken between display and confirm");
                self.draft.start_time = None;
                self.step = WizardStep::ChooseSlot;
                self.refresh_availability(date).await?;
                Err(WizardError::SlotTaken { date, start_minute })
            }
            Err(e) => Err(e),
        }
    }

    // ── Availability plumbing ───────────────────────────────────

    /// Fetch the date's bookings and generate its slot list; when the day is
    /// full, one batched range read feeds the lookahead search for an
    /// alternative date.
    async fn refresh_availability(
        &mut self,
        date: NaiveDate,
    ) -> Result<DayAvailability, WizardError> {
        let duration = self
            .draft
            .duration_minutes
            .ok_or(WizardError::Validation("service"))?;
        let exclude = self.draft.id;

        let store = self.store.clone();
        let existing =
            with_store_retry("list_bookings_for_date", || store.list_bookings_for_date(date))
                .await?;

        let now = clock::now_cutoff(date, self.config.timezone);
        let slots = generate_slots(date, duration, &existing, exclude, now, &self.config);
        metrics::counter!(observability::SLOT_QUERIES_TOTAL).increment(1);
        metrics::histogram!(observability::SLOTS_RETURNED).record(slots.len() as f64);

        let alternative = if slots.is_empty() {
            metrics::counter!(observability::SEARCH_FALLBACKS_TOTAL).increment(1);
            let window = lookahead_dates(date, &self.config);
            let store = self.store.clone();
            let by_date = with_store_retry("list_bookings_for_date_range", || {
                store.list_bookings_for_date_range(&window)
            })
            .await?;
            let found =
                find_nearest_available_date(date, duration, exclude, &self.config, &by_date);
            if found.is_none() {
                info!(%date, "no availability within lookahead window");
            }
            found
        } else {
            None
        };

        debug!(%date, slots = slots.len(), alternative = ?alternative, "availability computed");
        self.draft.booking_date = Some(date);
        let availability = DayAvailability { date, slots, alternative };
        self.availability = Some(availability.clone());
        Ok(availability)
    }
}

/// Run a store call under a timeout, retrying transient failures a bounded
/// number of times. Conflict and not-found rejections pass straight through.
async fn with_store_retry<T, F, Fut>(op: &'static str, mut call: F) -> Result<T, WizardError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut last = WizardError::Persistence(format!("{op}: retries exhausted"));
    for attempt in 0..=STORE_RETRIES {
        if attempt > 0 {
            metrics::counter!(observability::STORE_RETRIES_TOTAL).increment(1);
        }
        match tokio::time::timeout(STORE_TIMEOUT, call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) if e.is_transient() => {
                warn!(op, attempt, error = %e, "transient store failure");
                last = e.into();
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!(op, attempt, "store call timed out");
                last = WizardError::Persistence(format!("{op}: timed out"));
            }
        }
    }
    Err(last)
}
