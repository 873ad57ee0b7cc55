//! JSON import/export of a user's cards together with their review state.

use crate::database::store::ReviewStore;
use crate::error::ExportError;
use crate::models::ReviewState;
use crate::service::UserContext;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportedCard {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_state: Option<ReviewState>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardExport {
    pub exported_at: DateTime<Utc>,
    pub cards: Vec<ExportedCard>,
}

/// Writes an export document to `path` as pretty printed JSON.
pub fn write_export(export: &CardExport, path: &Path) -> Result<(), ExportError> {
    let json_string = serde_json::to_string_pretty(export)?;
    fs::write(path, json_string)?;
    Ok(())
}

pub fn read_export(path: &Path) -> Result<CardExport, ExportError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Exports all cards of the user, with their current review state, to `path`.
/// Returns the number of exported cards.
pub fn export_json_to_path<S: ReviewStore>(
    store: &S,
    ctx: &UserContext,
    path: &Path,
) -> Result<usize, ExportError> {
    let (cards, mut states) = store.snapshot(&ctx.user_id)?;
    let export = CardExport {
        exported_at: Utc::now(),
        cards: cards
            .into_iter()
            .map(|card| ExportedCard {
                review_state: states.remove(&card.id),
                front: card.front,
                back: card.back,
                tags: card.tags,
            })
            .collect(),
    };

    write_export(&export, path)?;
    info!(
        "Exported {} cards for user '{}' to {}",
        export.cards.len(),
        ctx.user_id,
        path.display()
    );
    Ok(export.cards.len())
}

/// Imports cards from `path` as new cards of the user.
/// Review states that break their invariants are dropped and the card starts fresh.
pub fn import_json<S: ReviewStore>(
    store: &S,
    ctx: &UserContext,
    path: &Path,
) -> Result<usize, ExportError> {
    let export = read_export(path)?;

    for exported in &export.cards {
        let card = store.add_card(&ctx.user_id, &exported.front, &exported.back, &exported.tags)?;
        if let Some(state) = &exported.review_state {
            match state.validate() {
                Ok(()) => store.upsert_review_state(&ctx.user_id, card.id, state)?,
                Err(e) => warn!("Dropping review state of imported card '{}': {}", card.front, e),
            }
        }
    }

    info!(
        "Imported {} cards for user '{}' from {}",
        export.cards.len(),
        ctx.user_id,
        path.display()
    );
    Ok(export.cards.len())
}
