//! Per-card memory parameters persisted after every review.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const DEFAULT_INTERVAL_DAYS: i32 = 1;

/// Scheduling state for one (user, card) pair. Replaced as a whole on each review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval: i32,
    pub repetitions: i32,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_due_at: DateTime<Utc>,
    /// Quality of the review that produced this state.
    pub quality: u8,
}

impl ReviewState {
    /// Checks the invariants the scheduler relies on.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return Err(SchedulerError::InvalidPriorState("ease factor below 1.3"));
        }
        if self.interval < 1 {
            return Err(SchedulerError::InvalidPriorState("interval below 1 day"));
        }
        if self.repetitions < 0 {
            return Err(SchedulerError::InvalidPriorState("negative repetitions"));
        }
        if self.quality > 5 {
            return Err(SchedulerError::InvalidPriorState("stored quality above 5"));
        }
        if self.next_due_at < self.last_reviewed_at {
            return Err(SchedulerError::InvalidPriorState(
                "due date before last review",
            ));
        }
        Ok(())
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due_at <= now
    }
}
