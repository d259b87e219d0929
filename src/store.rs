use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use ulid::Ulid;

use crate::engine::overlaps;
use crate::error::StoreError;
use crate::model::{Booking, BookingPayload};

/// Read/write contract the wizard needs from persistence. Reads and writes
/// are independent operations; `create_booking`/`update_booking` may still
/// reject with [`StoreError::SlotTaken`] when the written interval overlaps
/// a confirmed booking already on that date.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn list_bookings_for_date(&self, date: NaiveDate) -> Result<Vec<Booking>, StoreError>;

    /// Batched range read — one call covers the whole lookahead window.
    /// Every requested date gets an entry, empty when nothing is booked.
    async fn list_bookings_for_date_range(
        &self,
        dates: &[NaiveDate],
    ) -> Result<HashMap<NaiveDate, Vec<Booking>>, StoreError>;

    /// Confirmed bookings for `phone` on `from` or later, ordered by date
    /// and start time.
    async fn list_future_bookings_for_phone(
        &self,
        phone: &str,
        from: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError>;

    async fn create_booking(&self, payload: BookingPayload) -> Result<Booking, StoreError>;

    async fn update_booking(
        &self,
        id: Ulid,
        payload: BookingPayload,
    ) -> Result<Booking, StoreError>;

    async fn delete_booking(&self, id: Ulid) -> Result<(), StoreError>;
}

/// In-memory store: id → booking plus a per-date index. Reference adapter
/// for tests and hosts without real persistence.
///
/// Lock order is always date index before booking map, and never two date
/// entries at once.
#[derive(Default)]
pub struct MemoryStore {
    bookings: DashMap<Ulid, Booking>,
    by_date: DashMap<NaiveDate, Vec<Ulid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    /// Reject `payload` if it overlaps a confirmed booking among `ids`,
    /// ignoring `exclude` (the booking being updated).
    fn check_slot_free(
        &self,
        ids: &[Ulid],
        payload: &BookingPayload,
        exclude: Option<Ulid>,
    ) -> Result<(), StoreError> {
        for id in ids {
            if exclude == Some(*id) {
                continue;
            }
            if let Some(existing) = self.bookings.get(id)
                && existing.occupies_slot()
                && overlaps(
                    payload.start_time,
                    payload.duration_minutes,
                    existing.start_time,
                    existing.duration_minutes,
                )
            {
                return Err(StoreError::SlotTaken {
                    date: payload.booking_date,
                    start_minute: payload.start_time,
                });
            }
        }
        Ok(())
    }

    fn collect_date(&self, date: NaiveDate) -> Vec<Booking> {
        let mut out: Vec<Booking> = self
            .by_date
            .get(&date)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.bookings.get(id).map(|b| b.value().clone()))
                    .collect()
            })
            .unwrap_or_default();
        out.sort_by_key(|b| b.start_time);
        out
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn list_bookings_for_date(&self, date: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        Ok(self.collect_date(date))
    }

    async fn list_bookings_for_date_range(
        &self,
        dates: &[NaiveDate],
    ) -> Result<HashMap<NaiveDate, Vec<Booking>>, StoreError> {
        Ok(dates
            .iter()
            .map(|&date| (date, self.collect_date(date)))
            .collect())
    }

    async fn list_future_bookings_for_phone(
        &self,
        phone: &str,
        from: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        let mut out: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.customer_phone == phone && b.booking_date >= from && b.occupies_slot())
            .map(|b| b.value().clone())
            .collect();
        out.sort_by_key(|b| (b.booking_date, b.start_time));
        Ok(out)
    }

    async fn create_booking(&self, payload: BookingPayload) -> Result<Booking, StoreError> {
        let mut ids = self.by_date.entry(payload.booking_date).or_default();
        self.check_slot_free(&ids, &payload, None)?;
        let booking = payload.into_booking(Ulid::new());
        ids.push(booking.id);
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update_booking(
        &self,
        id: Ulid,
        payload: BookingPayload,
    ) -> Result<Booking, StoreError> {
        let old_date = match self.bookings.get(&id) {
            Some(b) => b.booking_date,
            None => return Err(StoreError::NotFound(id)),
        };
        let new_date = payload.booking_date;

        {
            let mut ids = self.by_date.entry(new_date).or_default();
            self.check_slot_free(&ids, &payload, Some(id))?;
            if old_date != new_date {
                ids.push(id);
            }
        }
        if old_date != new_date
            && let Some(mut ids) = self.by_date.get_mut(&old_date)
        {
            ids.retain(|x| *x != id);
        }

        let booking = payload.into_booking(id);
        self.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn delete_booking(&self, id: Ulid) -> Result<(), StoreError> {
        let date = match self.bookings.get(&id) {
            Some(b) => b.booking_date,
            None => return Err(StoreError::NotFound(id)),
        };
        if let Some(mut ids) = self.by_date.get_mut(&date) {
            ids.retain(|x| *x != id);
        }
        self.bookings.remove(&id);
        Ok(())
    }
}
