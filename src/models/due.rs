//! Selection of the cards that should be reviewed now.

use super::{Flashcard, ReviewState};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A card is due when it was never reviewed or its due time has arrived.
pub fn is_due(state: Option<&ReviewState>, now: DateTime<Utc>) -> bool {
    state.is_none_or(|s| s.is_due(now))
}

/// Returns the due subset of `cards`, given the latest state of each card keyed by card id.
///
/// Reviewed cards come first, most overdue first; never reviewed cards follow in
/// their original order.
pub fn due_cards<'a>(
    cards: &'a [Flashcard],
    states: &'a HashMap<i64, ReviewState>,
    now: DateTime<Utc>,
) -> Vec<(&'a Flashcard, Option<&'a ReviewState>)> {
    let mut due: Vec<_> = cards
        .iter()
        .map(|card| (card, states.get(&card.id)))
        .filter(|(_, state)| is_due(*state, now))
        .collect();

    // Stable sort keeps input order among equals
    due.sort_by_key(|(_, state)| match state {
        Some(s) => (0, Some(s.next_due_at)),
        None => (1, None),
    });

    due
}
