use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::WizardError;

/// Minutes since midnight — the only intra-day time type.
pub type Minutes = u32;

/// Lifecycle status of a persisted booking. Only `Confirmed` occupies a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// A single reserved interval on the shop calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub customer_phone: String,
    pub customer_name: String,
    pub service_id: String,
    pub service_label: String,
    pub duration_minutes: Minutes,
    /// Wheel radius class of the job. Opaque to the scheduler.
    pub radius: String,
    /// Civil date in the business timezone, no time component.
    pub booking_date: NaiveDate,
    /// Start of the half-open interval `[start_time, end_time())`.
    pub start_time: Minutes,
    pub status: BookingStatus,
    /// Set when this booking is the result of modifying a prior one.
    pub is_edited: bool,
}

impl Booking {
    /// Exclusive end of the reserved interval.
    pub fn end_time(&self) -> Minutes {
        self.start_time + self.duration_minutes
    }

    pub fn occupies_slot(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

/// Everything except the id — what the wizard hands to the store.
/// Inserts get a fresh id, updates keep the one they were addressed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPayload {
    pub customer_phone: String,
    pub customer_name: String,
    pub service_id: String,
    pub service_label: String,
    pub duration_minutes: Minutes,
    pub radius: String,
    pub booking_date: NaiveDate,
    pub start_time: Minutes,
    pub is_edited: bool,
}

impl BookingPayload {
    pub fn into_booking(self, id: Ulid) -> Booking {
        Booking {
            id,
            customer_phone: self.customer_phone,
            customer_name: self.customer_name,
            service_id: self.service_id,
            service_label: self.service_label,
            duration_minutes: self.duration_minutes,
            radius: self.radius,
            booking_date: self.booking_date,
            start_time: self.start_time,
            status: BookingStatus::Confirmed,
            is_edited: self.is_edited,
        }
    }
}

/// In-progress booking held by a wizard session. Populated incrementally
/// across steps; becomes a persisted `Booking` only at confirmation.
///
/// `id` is present exactly when the draft edits an existing booking — its
/// presence is what decides insert vs. update at the end of the flow.
#[derive(Debug, Clone, Default)]
pub struct BookingDraft {
    pub id: Option<Ulid>,
    pub customer_phone: String,
    pub customer_name: String,
    pub service_id: Option<String>,
    pub service_label: String,
    pub duration_minutes: Option<Minutes>,
    pub radius: Option<String>,
    pub booking_date: Option<NaiveDate>,
    pub start_time: Option<Minutes>,
}

impl BookingDraft {
    /// Copy an existing booking (including its id) into an editable draft.
    pub fn from_existing(booking: &Booking) -> Self {
        Self {
            id: Some(booking.id),
            customer_phone: booking.customer_phone.clone(),
            customer_name: booking.customer_name.clone(),
            service_id: Some(booking.service_id.clone()),
            service_label: booking.service_label.clone(),
            duration_minutes: Some(booking.duration_minutes),
            radius: Some(booking.radius.clone()),
            booking_date: Some(booking.booking_date),
            start_time: Some(booking.start_time),
        }
    }

    /// Build the store payload, failing on the first missing required field.
    pub fn payload(&self) -> Result<BookingPayload, WizardError> {
        if self.customer_phone.trim().is_empty() {
            return Err(WizardError::Validation("phone"));
        }
        let service_id = self
            .service_id
            .clone()
            .ok_or(WizardError::Validation("service"))?;
        let duration_minutes = self
            .duration_minutes
            .ok_or(WizardError::Validation("service"))?;
        let radius = self.radius.clone().ok_or(WizardError::Validation("radius"))?;
        let booking_date = self.booking_date.ok_or(WizardError::Validation("slot"))?;
        let start_time = self.start_time.ok_or(WizardError::Validation("slot"))?;
        if self.customer_name.trim().is_empty() {
            return Err(WizardError::Validation("name"));
        }
        Ok(BookingPayload {
            customer_phone: self.customer_phone.clone(),
            customer_name: self.customer_name.clone(),
            service_id,
            service_label: self.service_label.clone(),
            duration_minutes,
            radius,
            booking_date,
            start_time,
            is_edited: self.id.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn confirmed(start: Minutes, duration: Minutes) -> Booking {
        Booking {
            id: Ulid::new(),
            customer_phone: "+3161234".into(),
            customer_name: "Ada".into(),
            service_id: "tire-swap".into(),
            service_label: "Seasonal tire change".into(),
            duration_minutes: duration,
            radius: "R16".into(),
            booking_date: date(2026, 4, 10),
            start_time: start,
            status: BookingStatus::Confirmed,
            is_edited: false,
        }
    }

    #[test]
    fn end_time_is_exclusive() {
        let b = confirmed(540, 60);
        assert_eq!(b.end_time(), 600);
    }

    #[test]
    fn cancelled_does_not_occupy() {
        let mut b = confirmed(540, 60);
        assert!(b.occupies_slot());
        b.status = BookingStatus::Cancelled;
        assert!(!b.occupies_slot());
    }

    #[test]
    fn draft_from_existing_carries_id_and_slot() {
        let b = confirmed(600, 30);
        let draft = BookingDraft::from_existing(&b);
        assert_eq!(draft.id, Some(b.id));
        assert_eq!(draft.booking_date, Some(b.booking_date));
        assert_eq!(draft.start_time, Some(b.start_time));
        assert_eq!(draft.service_id.as_deref(), Some("tire-swap"));
    }

    #[test]
    fn payload_reports_first_missing_field() {
        let mut draft = BookingDraft::default();
        assert!(matches!(draft.payload(), Err(WizardError::Validation("phone"))));

        draft.customer_phone = "+3161234".into();
        assert!(matches!(draft.payload(), Err(WizardError::Validation("service"))));

        draft.service_id = Some("balance".into());
        draft.service_label = "Wheel balancing".into();
        draft.duration_minutes = Some(30);
        assert!(matches!(draft.payload(), Err(WizardError::Validation("radius"))));

        draft.radius = Some("R15".into());
        assert!(matches!(draft.payload(), Err(WizardError::Validation("slot"))));

        draft.booking_date = Some(date(2026, 4, 10));
        draft.start_time = Some(480);
        assert!(matches!(draft.payload(), Err(WizardError::Validation("name"))));

        draft.customer_name = "Ada".into();
        let payload = draft.payload().unwrap();
        assert!(!payload.is_edited);
    }

    #[test]
    fn payload_marks_edit_when_draft_has_id() {
        let b = confirmed(480, 30);
        let draft = BookingDraft::from_existing(&b);
        let payload = draft.payload().unwrap();
        assert!(payload.is_edited);
        assert_eq!(payload.start_time, 480);
    }

    #[test]
    fn payload_into_booking_is_confirmed() {
        let b = confirmed(480, 30);
        let payload = BookingDraft::from_existing(&b).payload().unwrap();
        let id = Ulid::new();
        let round = payload.into_booking(id);
        assert_eq!(round.id, id);
        assert_eq!(round.status, BookingStatus::Confirmed);
    }
}
