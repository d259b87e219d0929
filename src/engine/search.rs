use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use ulid::Ulid;

use crate::config::ScheduleConfig;
use crate::model::{Booking, Minutes};

use super::slots::generate_slots;

// ── Availability search ─────────────────────────────────────────

/// The `lookahead_days` calendar dates strictly after `base`, ascending.
/// The session fetches bookings for exactly this window in one range read.
pub fn lookahead_dates(base: NaiveDate, config: &ScheduleConfig) -> Vec<NaiveDate> {
    (1..=u64::from(config.lookahead_days))
        .filter_map(|offset| base.checked_add_days(Days::new(offset)))
        .collect()
}

/// First date in the lookahead window with at least one free slot, or `None`
/// when the window is exhausted.
///
/// Synchronous over a pre-fetched `bookings_by_date` mapping; a date missing
/// from the mapping has no bookings. Future dates never need the
/// current-time filter.
pub fn find_nearest_available_date(
    base_date: NaiveDate,
    duration_minutes: Minutes,
    exclude_id: Option<Ulid>,
    config: &ScheduleConfig,
    bookings_by_date: &HashMap<NaiveDate, Vec<Booking>>,
) -> Option<NaiveDate> {
    for date in lookahead_dates(base_date, config) {
        let existing = bookings_by_date
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let slots = generate_slots(date, duration_minutes, existing, exclude_id, None, config);
        if !slots.is_empty() {
            return Some(date);
        }
    }
    None
}
