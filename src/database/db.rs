//! Database operations for the review scheduler
//!
//! Handles SQLite schema initialization, card storage, and the per-(user, card)
//! review state that the SM-2 scheduler reads and writes. Timestamps are stored
//! as unix seconds.

use crate::models::{Flashcard, ReviewLogEntry, ReviewState};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use std::collections::HashMap;
use std::path::Path;

/// Opens (or creates) the database file and makes sure all tables exist
pub fn open_database(path: &Path) -> Result<Connection> {
    info!("Opening database at {}", path.display());
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, used by tests and throwaway sessions
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates tables for cards, review states and review history
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cards_user ON cards(user_id);

        -- One row per (user, card); every review overwrites it
        CREATE TABLE IF NOT EXISTS review_states (
            user_id TEXT NOT NULL,
            card_id INTEGER NOT NULL,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 1,
            repetitions INTEGER NOT NULL DEFAULT 0,
            last_reviewed_at INTEGER NOT NULL,
            next_due_at INTEGER NOT NULL,
            quality INTEGER NOT NULL,
            PRIMARY KEY (user_id, card_id),
            FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS review_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            card_id INTEGER NOT NULL,
            quality INTEGER NOT NULL,
            ease_factor REAL NOT NULL,
            interval_days INTEGER NOT NULL,
            reviewed_at INTEGER NOT NULL,
            FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
        );
        ",
    )?;

    debug!("Database schema ready");
    Ok(())
}

fn to_datetime(secs: i64, column: usize) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(column, secs))
}

fn card_from_row(row: &Row<'_>) -> Result<Flashcard> {
    let tags_json: String = row.get(4)?;
    let tags = serde_json::from_str(&tags_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Flashcard {
        id: row.get(0)?,
        user_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        tags,
        created_at: to_datetime(row.get(5)?, 5)?,
    })
}

fn state_from_row(row: &Row<'_>) -> Result<ReviewState> {
    Ok(ReviewState {
        ease_factor: row.get(0)?,
        interval: row.get(1)?,
        repetitions: row.get(2)?,
        last_reviewed_at: to_datetime(row.get(3)?, 3)?,
        next_due_at: to_datetime(row.get(4)?, 4)?,
        quality: row.get(5)?,
    })
}

/// Inserts a card for a user and returns its ID
pub fn add_card(
    user_id: &str,
    front: &str,
    back: &str,
    tags: &[String],
    created_at: DateTime<Utc>,
    conn: &Connection,
) -> Result<i64> {
    let tags_json = serde_json::to_string(tags)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO cards (user_id, front, back, tags, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, front, back, tags_json, created_at.timestamp()],
    )?;

    let id = conn.last_insert_rowid();
    info!("Card {} created for user '{}'", id, user_id);
    Ok(id)
}

/// Retrieves a single card, only if it belongs to the user
pub fn get_card(user_id: &str, card_id: i64, conn: &Connection) -> Result<Option<Flashcard>> {
    conn.query_row(
        "SELECT id, user_id, front, back, tags, created_at FROM cards WHERE id = ?1 AND user_id = ?2",
        params![card_id, user_id],
        card_from_row,
    )
    .optional()
}

/// Retrieves all cards of a user in creation order
pub fn get_cards_for_user(user_id: &str, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, front, back, tags, created_at FROM cards WHERE user_id = ?1 ORDER BY id",
    )?;

    let cards = stmt
        .query_map(params![user_id], card_from_row)?
        .collect::<Result<Vec<Flashcard>>>()?;

    Ok(cards)
}

/// Latest review state for (user, card), `None` if the card was never reviewed
pub fn fetch_review_state(
    user_id: &str,
    card_id: i64,
    conn: &Connection,
) -> Result<Option<ReviewState>> {
    conn.query_row(
        "SELECT ease_factor, interval_days, repetitions, last_reviewed_at, next_due_at, quality
         FROM review_states WHERE user_id = ?1 AND card_id = ?2",
        params![user_id, card_id],
        state_from_row,
    )
    .optional()
}

/// All review states of a user keyed by card ID
pub fn get_review_states_for_user(
    user_id: &str,
    conn: &Connection,
) -> Result<HashMap<i64, ReviewState>> {
    let mut stmt = conn.prepare(
        "SELECT card_id, ease_factor, interval_days, repetitions, last_reviewed_at, next_due_at, quality
         FROM review_states WHERE user_id = ?1",
    )?;

    let states = stmt
        .query_map(params![user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                ReviewState {
                    ease_factor: row.get(1)?,
                    interval: row.get(2)?,
                    repetitions: row.get(3)?,
                    last_reviewed_at: to_datetime(row.get(4)?, 4)?,
                    next_due_at: to_datetime(row.get(5)?, 5)?,
                    quality: row.get(6)?,
                },
            ))
        })?
        .collect::<Result<HashMap<i64, ReviewState>>>()?;

    Ok(states)
}

/// Writes the review state for (user, card), replacing any earlier one
pub fn upsert_review_state(
    user_id: &str,
    card_id: i64,
    state: &ReviewState,
    conn: &Connection,
) -> Result<()> {
    conn.execute(
        "INSERT INTO review_states
            (user_id, card_id, ease_factor, interval_days, repetitions, last_reviewed_at, next_due_at, quality)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(user_id, card_id) DO UPDATE SET
            ease_factor = excluded.ease_factor,
            interval_days = excluded.interval_days,
            repetitions = excluded.repetitions,
            last_reviewed_at = excluded.last_reviewed_at,
            next_due_at = excluded.next_due_at,
            quality = excluded.quality",
        params![
            user_id,
            card_id,
            state.ease_factor,
            state.interval,
            state.repetitions,
            state.last_reviewed_at.timestamp(),
            state.next_due_at.timestamp(),
            state.quality,
        ],
    )?;

    Ok(())
}

/// Appends a review to the user's history
pub fn append_review_log(
    user_id: &str,
    card_id: i64,
    state: &ReviewState,
    conn: &Connection,
) -> Result<()> {
    conn.execute(
        "INSERT INTO review_log (user_id, card_id, quality, ease_factor, interval_days, reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            card_id,
            state.quality,
            state.ease_factor,
            state.interval,
            state.last_reviewed_at.timestamp(),
        ],
    )?;

    Ok(())
}

/// Review history of a user, oldest first
pub fn get_review_log(user_id: &str, conn: &Connection) -> Result<Vec<ReviewLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT card_id, quality, ease_factor, interval_days, reviewed_at
         FROM review_log WHERE user_id = ?1 ORDER BY reviewed_at, id",
    )?;

    let log = stmt
        .query_map(params![user_id], |row| {
            Ok(ReviewLogEntry {
                card_id: row.get(0)?,
                quality: row.get(1)?,
                ease_factor: row.get(2)?,
                interval: row.get(3)?,
                reviewed_at: to_datetime(row.get(4)?, 4)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(log)
}
