//! Civil "today"/"now" in the business timezone.
//!
//! Every current-time comparison in the crate goes through here with the
//! timezone as an explicit parameter. The executing device's local timezone
//! is never consulted, so behavior is identical wherever the client runs.

use chrono::{NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use crate::model::Minutes;

/// Calendar date it currently is at the business.
pub fn civil_today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Minutes since midnight at the business.
pub fn civil_now_minutes(tz: Tz) -> Minutes {
    let now = Utc::now().with_timezone(&tz).time();
    now.hour() * 60 + now.minute()
}

/// `Some(now)` when `date` is the business's today, `None` otherwise.
/// Feeds the slot generator's current-time filter.
pub fn now_cutoff(date: NaiveDate, tz: Tz) -> Option<Minutes> {
    (date == civil_today(tz)).then(|| civil_now_minutes(tz))
}
