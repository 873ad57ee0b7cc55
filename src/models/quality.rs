//! Review quality ratings.
//!
//! Quality is the SM-2 0-5 scale:
//! - 0: complete blackout
//! - 1: incorrect, but the answer was recognized
//! - 2: incorrect, but the answer seemed easy to recall
//! - 3: correct with serious difficulty
//! - 4: correct after hesitation
//! - 5: perfect response
//!
//! Grades 3 and above count as a successful recall.

use crate::error::SchedulerError;
use std::fmt;
use std::str::FromStr;

/// A validated quality grade in 0..=5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;
    pub const PASSING: u8 = 3;

    pub fn new(value: i64) -> Result<Self, SchedulerError> {
        u8::try_from(value)
            .ok()
            .filter(|&q| q <= Self::MAX)
            .map(Quality)
            .ok_or_else(|| SchedulerError::InvalidQuality(value.to_string()))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self.0 >= Self::PASSING
    }
}

impl TryFrom<i64> for Quality {
    type Error = SchedulerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl TryFrom<f64> for Quality {
    type Error = SchedulerError;

    /// Fractional grades are rejected, never rounded.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.fract() != 0.0 || !value.is_finite() {
            return Err(SchedulerError::InvalidQuality(value.to_string()));
        }
        Quality::new(value as i64)
    }
}

impl FromStr for Quality {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<i64>()
            .map_err(|_| SchedulerError::InvalidQuality(trimmed.to_string()))
            .and_then(Quality::new)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four review buttons offered after the answer is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rating {
    Forgot,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Forgot, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn quality(self) -> Quality {
        match self {
            Rating::Forgot => Quality(0),
            Rating::Hard => Quality(3),
            Rating::Good => Quality(4),
            Rating::Easy => Quality(5),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Forgot => "forgot",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rating::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown rating '{s}', expected forgot, hard, good or easy"))
    }
}
