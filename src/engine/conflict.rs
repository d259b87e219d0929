use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::{Booking, Minutes};

/// Half-open interval overlap: `[start, start+duration)` on the same day.
/// Touching endpoints are not a conflict — back-to-back bookings are allowed.
pub fn overlaps(
    a_start: Minutes,
    a_duration: Minutes,
    b_start: Minutes,
    b_duration: Minutes,
) -> bool {
    a_start < b_start + b_duration && b_start < a_start + a_duration
}

/// Does a candidate `[start, start+duration)` collide with any confirmed
/// booking on `date`? `exclude_id` lets an edit-in-progress ignore the
/// booking being replaced.
pub(crate) fn blocked_by_existing(
    date: NaiveDate,
    start: Minutes,
    duration: Minutes,
    existing: &[Booking],
    exclude_id: Option<Ulid>,
) -> bool {
    existing.iter().any(|b| {
        b.booking_date == date
            && b.occupies_slot()
            && exclude_id != Some(b.id)
            && overlaps(start, duration, b.start_time, b.duration_minutes)
    })
}
