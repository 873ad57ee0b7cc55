pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod service;

pub use config::Config;
pub use database::store::{CardStore, ReviewStore, SqliteStore};
pub use error::{ReviewError, SchedulerError, StoreError};
pub use models::{Flashcard, LearningSession, Quality, Rating, ReviewState, compute_next};
pub use service::{DueCard, UserContext};
