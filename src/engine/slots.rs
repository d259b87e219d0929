use chrono::NaiveDate;
use ulid::Ulid;

use crate::config::ScheduleConfig;
use crate::model::{Booking, Minutes};

use super::conflict::blocked_by_existing;

// ── Slot generation ─────────────────────────────────────────────

/// Enumerate valid start times for `date`, ascending on the booking grid.
///
/// Candidates are `open_minute + k * grid_step` for as long as the whole
/// service still fits before closing. A candidate survives when it is not in
/// the past (`now_if_today`, supplied only when `date` is the business's
/// today — a candidate exactly equal to "now" is kept) and does not overlap
/// any confirmed booking on that date other than `exclude_id`.
///
/// Pure: no clock reads, no I/O — identical inputs give identical output.
pub fn generate_slots(
    date: NaiveDate,
    duration_minutes: Minutes,
    existing: &[Booking],
    exclude_id: Option<Ulid>,
    now_if_today: Option<Minutes>,
    config: &ScheduleConfig,
) -> Vec<Minutes> {
    let mut slots = Vec::new();
    if duration_minutes == 0 || config.grid_step_minutes == 0 {
        return slots;
    }
    let mut t = config.open_minute;
    while t + duration_minutes <= config.close_minute {
        let in_past = now_if_today.is_some_and(|now| t < now);
        if !in_past && !blocked_by_existing(date, t, duration_minutes, existing, exclude_id) {
            slots.push(t);
        }
        t += config.grid_step_minutes;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BookingStatus;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 10).unwrap()
    }

    fn config() -> ScheduleConfig {
        ScheduleConfig::default() // open 480, close 1140, step 10
    }

    fn booking(start: Minutes, duration: Minutes) -> Booking {
        Booking {
            id: Ulid::new(),
            customer_phone: "+3161234".into(),
            customer_name: "Ada".into(),
            service_id: "balance".into(),
            service_label: "Wheel balancing".into(),
            duration_minutes: duration,
            radius: "R15".into(),
            booking_date: day(),
            start_time: start,
            status: BookingStatus::Confirmed,
            is_edited: false,
        }
    }

    #[test]
    fn empty_day_yields_full_grid() {
        // (1140 - 480 - 30) / 10 + 1 = 64 candidates for a 30-minute job.
        let slots = generate_slots(day(), 30, &[], None, None, &config());
        assert_eq!(slots.len(), 64);
        assert_eq!(slots.first(), Some(&480));
        assert_eq!(slots.last(), Some(&1110));
    }

    #[test]
    fn slots_fit_within_hours_and_ascend_on_grid() {
        let config = config();
        for duration in [10, 30, 45, 60, 120] {
            let slots = generate_slots(day(), duration, &[], None, None, &config);
            assert!(!slots.is_empty());
            for pair in slots.windows(2) {
                assert!(pair[0] < pair[1]);
                assert_eq!((pair[1] - pair[0]) % config.grid_step_minutes, 0);
            }
            for &t in &slots {
                assert!(t >= config.open_minute);
                assert!(t + duration <= config.close_minute);
                assert_eq!((t - config.open_minute) % config.grid_step_minutes, 0);
            }
        }
    }

    #[test]
    fn booked_interval_blocks_overlapping_candidates() {
        // Existing 09:00–10:00, requesting 30 minutes: 510 touches and is
        // valid, 520..590 overlap, 600 starts exactly at the end boundary.
        let existing = vec![booking(540, 60)];
        let slots = generate_slots(day(), 30, &existing, None, None, &config());
        assert!(slots.contains(&510));
        assert!(slots.contains(&600));
        for blocked in [520, 530, 540, 550, 560, 570, 580, 590] {
            assert!(!slots.contains(&blocked), "minute {blocked} should be blocked");
        }
    }

    #[test]
    fn today_cutoff_drops_past_candidates_keeps_exact_now() {
        let slots = generate_slots(day(), 30, &[], None, Some(600), &config());
        assert_eq!(slots.first(), Some(&600)); // equal to "now" is kept
        assert!(slots.iter().all(|&t| t >= 600));

        // A "now" that is off-grid keeps the next grid candidate.
        let slots = generate_slots(day(), 30, &[], None, Some(605), &config());
        assert_eq!(slots.first(), Some(&610));
    }

    #[test]
    fn no_cutoff_for_other_days() {
        let slots = generate_slots(day(), 30, &[], None, None, &config());
        assert_eq!(slots.first(), Some(&480));
    }

    #[test]
    fn oversized_duration_yields_empty() {
        let slots = generate_slots(day(), 700, &[], None, None, &config());
        assert!(slots.is_empty());
    }

    #[test]
    fn duration_filling_the_day_yields_single_slot() {
        let slots = generate_slots(day(), 660, &[], None, None, &config());
        assert_eq!(slots, vec![480]);
    }

    #[test]
    fn excluding_the_only_booking_restores_full_grid() {
        let b = booking(540, 60);
        let id = b.id;
        let existing = vec![b];
        let unconstrained = generate_slots(day(), 30, &[], None, None, &config());
        let with_exclusion = generate_slots(day(), 30, &existing, Some(id), None, &config());
        assert_eq!(with_exclusion, unconstrained);
    }

    #[test]
    fn cancelled_bookings_do_not_block() {
        let mut b = booking(540, 60);
        b.status = BookingStatus::Cancelled;
        let slots = generate_slots(day(), 30, &[b], None, None, &config());
        assert_eq!(slots.len(), 64);
    }

    #[test]
    fn bookings_on_other_dates_do_not_block() {
        let mut b = booking(540, 60);
        b.booking_date = day().succ_opt().unwrap();
        let slots = generate_slots(day(), 30, &[b], None, None, &config());
        assert_eq!(slots.len(), 64);
    }

    #[test]
    fn back_to_back_bookings_leave_no_gap_slots() {
        // 08:00–09:00 and 09:00–10:00 booked; a 30-minute job first fits at 10:00.
        let existing = vec![booking(480, 60), booking(540, 60)];
        let slots = generate_slots(day(), 30, &existing, None, None, &config());
        assert_eq!(slots.first(), Some(&600));
    }
}
