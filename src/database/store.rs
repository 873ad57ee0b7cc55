//! Repository interfaces for cards and review state, and their SQLite implementation.
//!
//! Review states are keyed by (user, card). `apply_review` is the only write path
//! used by the review flow: it reads the prior state, computes the next one and
//! persists it inside a single transaction, so concurrent reviews of the same
//! card never both build on the same prior state.

use super::db;
use crate::error::{ReviewError, SchedulerError, StoreError};
use crate::models::{Flashcard, ReviewLogEntry, ReviewState};
use chrono::Utc;
use log::debug;
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Read access to a user's cards, plus card creation.
pub trait CardStore {
    fn add_card(
        &self,
        user_id: &str,
        front: &str,
        back: &str,
        tags: &[String],
    ) -> Result<Flashcard, StoreError>;

    fn list_cards(&self, user_id: &str) -> Result<Vec<Flashcard>, StoreError>;
}

/// Persistence of the review state for each (user, card).
pub trait ReviewStore: CardStore {
    fn fetch_review_state(
        &self,
        user_id: &str,
        card_id: i64,
    ) -> Result<Option<ReviewState>, StoreError>;

    /// Writes the state, overwriting any earlier state for the same key.
    fn upsert_review_state(
        &self,
        user_id: &str,
        card_id: i64,
        state: &ReviewState,
    ) -> Result<(), StoreError>;

    /// Atomic read-modify-write of one card's state.
    ///
    /// `compute` receives the current state (or `None`). Nothing is written when
    /// it fails.
    fn apply_review<F>(
        &self,
        user_id: &str,
        card_id: i64,
        compute: F,
    ) -> Result<ReviewState, ReviewError>
    where
        F: FnOnce(Option<&ReviewState>) -> Result<ReviewState, SchedulerError>;

    /// Cards and states read together, so the due set never mixes two points in time.
    fn snapshot(
        &self,
        user_id: &str,
    ) -> Result<(Vec<Flashcard>, HashMap<i64, ReviewState>), StoreError>;

    fn review_log(&self, user_id: &str) -> Result<Vec<ReviewLogEntry>, StoreError>;
}

/// SQLite backed store. Cloning shares the same connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::from_connection(db::open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    /// Wraps a connection whose schema was already initialized.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl CardStore for SqliteStore {
    fn add_card(
        &self,
        user_id: &str,
        front: &str,
        back: &str,
        tags: &[String],
    ) -> Result<Flashcard, StoreError> {
        let conn = self.lock()?;
        let created_at = Utc::now();
        let id = db::add_card(user_id, front, back, tags, created_at, &conn)?;
        db::get_card(user_id, id, &conn)?.ok_or_else(|| StoreError::CardNotFound {
            user_id: user_id.to_string(),
            card_id: id,
        })
    }

    fn list_cards(&self, user_id: &str) -> Result<Vec<Flashcard>, StoreError> {
        let conn = self.lock()?;
        Ok(db::get_cards_for_user(user_id, &conn)?)
    }
}

impl ReviewStore for SqliteStore {
    fn fetch_review_state(
        &self,
        user_id: &str,
        card_id: i64,
    ) -> Result<Option<ReviewState>, StoreError> {
        let conn = self.lock()?;
        Ok(db::fetch_review_state(user_id, card_id, &conn)?)
    }

    fn upsert_review_state(
        &self,
        user_id: &str,
        card_id: i64,
        state: &ReviewState,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        Ok(db::upsert_review_state(user_id, card_id, state, &conn)?)
    }

    fn apply_review<F>(
        &self,
        user_id: &str,
        card_id: i64,
        compute: F,
    ) -> Result<ReviewState, ReviewError>
    where
        F: FnOnce(Option<&ReviewState>) -> Result<ReviewState, SchedulerError>,
    {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front, which also serializes other processes
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if db::get_card(user_id, card_id, &tx)?.is_none() {
            return Err(StoreError::CardNotFound {
                user_id: user_id.to_string(),
                card_id,
            }
            .into());
        }

        let prior = db::fetch_review_state(user_id, card_id, &tx)?;
        // Dropping `tx` on error rolls back
        let next = compute(prior.as_ref())?;

        db::upsert_review_state(user_id, card_id, &next, &tx)?;
        db::append_review_log(user_id, card_id, &next, &tx)?;
        tx.commit()?;

        debug!(
            "Review stored for user '{}' card {}: reps={} interval={}d",
            user_id, card_id, next.repetitions, next.interval
        );
        Ok(next)
    }

    fn snapshot(
        &self,
        user_id: &str,
    ) -> Result<(Vec<Flashcard>, HashMap<i64, ReviewState>), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let cards = db::get_cards_for_user(user_id, &tx)?;
        let states = db::get_review_states_for_user(user_id, &tx)?;
        tx.commit()?;
        Ok((cards, states))
    }

    fn review_log(&self, user_id: &str) -> Result<Vec<ReviewLogEntry>, StoreError> {
        let conn = self.lock()?;
        Ok(db::get_review_log(user_id, &conn)?)
    }
}
