//! Error types for scheduling, storage and the review flow.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pure scheduling computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// Quality was outside 0..=5 or not an integer.
    #[error("invalid quality {0:?}, expected an integer between 0 and 5")]
    InvalidQuality(String),

    /// The stored state handed to the scheduler breaks its own invariants.
    #[error("invalid prior review state: {0}")]
    InvalidPriorState(&'static str),
}

/// Errors raised by the card and review store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("card {card_id} not found for user {user_id}")]
    CardNotFound { user_id: String, card_id: i64 },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Errors from recording a review: either the computation or the store failed.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for ReviewError {
    fn from(err: rusqlite::Error) -> Self {
        ReviewError::Store(StoreError::Unavailable(err))
    }
}

/// Errors from JSON export and import of a user's cards.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from loading the TOML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ReviewError {
    /// Returns `true` if the request itself was bad and retrying cannot help.
    pub fn is_rejected(&self) -> bool {
        matches!(self, ReviewError::Scheduler(_))
    }
}
