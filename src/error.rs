use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::Minutes;

/// Failures at the storage seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transient read/write failure — worth retrying.
    Unavailable(String),
    /// Write rejected: the interval overlaps a confirmed booking on that date.
    SlotTaken { date: NaiveDate, start_minute: Minutes },
    NotFound(Ulid),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(e) => write!(f, "store unavailable: {e}"),
            StoreError::SlotTaken { date, start_minute } => {
                write!(f, "slot taken: {date} at minute {start_minute}")
            }
            StoreError::NotFound(id) => write!(f, "booking not found: {id}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Failures surfaced by the wizard state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// Required field missing or invalid; the step does not advance.
    /// Carries the field name for the inline message.
    Validation(&'static str),
    /// An operation was called in the wrong step.
    StepMismatch {
        expected: &'static str,
        got: &'static str,
    },
    /// Store call failed or timed out after retries. The draft is preserved
    /// so the user can retry without re-entering data.
    Persistence(String),
    /// The chosen slot was booked by someone else between display and
    /// confirmation. The session has already returned to slot selection.
    SlotTaken { date: NaiveDate, start_minute: Minutes },
    NotFound(Ulid),
}

impl std::fmt::Display for WizardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardError::Validation(field) => write!(f, "missing or invalid {field}"),
            WizardError::StepMismatch { expected, got } => {
                write!(f, "step mismatch: expected {expected}, session is at {got}")
            }
            WizardError::Persistence(e) => write!(f, "persistence failure: {e}"),
            WizardError::SlotTaken { date, start_minute } => {
                write!(f, "slot just taken: {date} at minute {start_minute}")
            }
            WizardError::NotFound(id) => write!(f, "booking not found: {id}"),
        }
    }
}

impl std::error::Error for WizardError {}

impl From<StoreError> for WizardError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => WizardError::Persistence(msg),
            StoreError::SlotTaken { date, start_minute } => {
                WizardError::SlotTaken { date, start_minute }
            }
            StoreError::NotFound(id) => WizardError::NotFound(id),
        }
    }
}
