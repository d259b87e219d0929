use chrono_tz::Tz;
use serde::Serialize;

use crate::model::Minutes;

/// Scheduling constants for the business: opening hours, the slot grid,
/// the lookahead window and the fixed civil timezone all "today"/"now"
/// comparisons run in.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Opening time, minutes since midnight.
    pub open_minute: Minutes,
    /// Closing time, minutes since midnight. Every booking must end by it.
    pub close_minute: Minutes,
    /// Granularity at which start times are considered.
    pub grid_step_minutes: Minutes,
    /// How many days after a full day the availability search scans.
    pub lookahead_days: u32,
    pub timezone: Tz,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            open_minute: 480,
            close_minute: 1140,
            grid_step_minutes: 10,
            lookahead_days: 4,
            timezone: chrono_tz::Europe::Berlin,
        }
    }
}

impl ScheduleConfig {
    /// Read overrides from `BOOKSLOT_*` env vars, falling back to defaults
    /// for anything absent or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            open_minute: env_parse("BOOKSLOT_OPEN_MINUTE", defaults.open_minute),
            close_minute: env_parse("BOOKSLOT_CLOSE_MINUTE", defaults.close_minute),
            grid_step_minutes: env_parse("BOOKSLOT_GRID_STEP_MINUTES", defaults.grid_step_minutes),
            lookahead_days: env_parse("BOOKSLOT_LOOKAHEAD_DAYS", defaults.lookahead_days),
            timezone: std::env::var("BOOKSLOT_TIMEZONE")
                .ok()
                .and_then(|s| s.parse::<Tz>().ok())
                .unwrap_or(defaults.timezone),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.open_minute >= self.close_minute {
            return Err("open_minute must be before close_minute");
        }
        if self.close_minute > 24 * 60 {
            return Err("close_minute past end of day");
        }
        if self.grid_step_minutes == 0 {
            return Err("grid_step_minutes must be positive");
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// One entry of the static service catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceOption {
    pub id: &'static str,
    pub label: &'static str,
    pub duration_minutes: Minutes,
}

/// Services bookable online, in display order.
pub const DEFAULT_CATALOG: &[ServiceOption] = &[
    ServiceOption {
        id: "tire-swap",
        label: "Seasonal tire change",
        duration_minutes: 60,
    },
    ServiceOption {
        id: "balance",
        label: "Wheel balancing",
        duration_minutes: 30,
    },
    ServiceOption {
        id: "puncture",
        label: "Puncture repair",
        duration_minutes: 40,
    },
    ServiceOption {
        id: "rotation",
        label: "Tire rotation",
        duration_minutes: 30,
    },
];

pub fn default_catalog() -> &'static [ServiceOption] {
    DEFAULT_CATALOG
}

/// Selectable wheel radius classes.
pub const WHEEL_RADIUS_OPTIONS: &[&str] =
    &["R13", "R14", "R15", "R16", "R17", "R18", "R19", "R20+"];

pub fn is_known_radius(radius: &str) -> bool {
    WHEEL_RADIUS_OPTIONS.contains(&radius)
}
