//! Operations the application runs on behalf of an authenticated user.
//!
//! Every call takes an explicit [`UserContext`]; there is no ambient session.

use crate::database::store::ReviewStore;
use crate::error::{ReviewError, StoreError};
use crate::models::{
    DailyProgress, Flashcard, Quality, ReviewState, daily_progress, due_cards, parse_tags, sm2,
};
use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, info};

/// Identity of the user an operation acts for, resolved by authentication upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// A due card together with its current state (`None` when never reviewed).
#[derive(Clone, Debug, PartialEq)]
pub struct DueCard {
    pub card: Flashcard,
    pub state: Option<ReviewState>,
}

/// Creates a card. Front and back are required; tags come as a comma separated list.
pub fn create_card<S: ReviewStore>(
    store: &S,
    ctx: &UserContext,
    front: &str,
    back: &str,
    tags: &str,
) -> Result<Flashcard, StoreError> {
    if front.trim().is_empty() {
        return Err(StoreError::MissingField("front"));
    }
    if back.trim().is_empty() {
        return Err(StoreError::MissingField("back"));
    }

    store.add_card(&ctx.user_id, front.trim(), back.trim(), &parse_tags(tags))
}

/// Records a review of `card_id` with the given quality and returns the new state.
///
/// The quality is validated before the store is touched. `now` is truncated to
/// whole seconds, the precision the store keeps, so the returned state is the
/// stored one.
pub fn record_review<S: ReviewStore>(
    store: &S,
    ctx: &UserContext,
    card_id: i64,
    quality: i64,
    now: DateTime<Utc>,
) -> Result<ReviewState, ReviewError> {
    let quality = Quality::new(quality)?;
    let now = now.trunc_subsecs(0);
    let state = store.apply_review(&ctx.user_id, card_id, |prior| {
        // A concurrent submission may have been stored with a later timestamp
        let at = prior.map_or(now, |p| p.last_reviewed_at.max(now));
        sm2::schedule(prior, quality, at)
    })?;

    info!(
        "User '{}' reviewed card {} with quality {}, next due {}",
        ctx.user_id,
        card_id,
        quality,
        state.next_due_at.format("%Y-%m-%d")
    );
    Ok(state)
}

/// Cards due for the user at `now`. Cards and states are read in one snapshot first.
pub fn due_for_user<S: ReviewStore>(
    store: &S,
    ctx: &UserContext,
    now: DateTime<Utc>,
) -> Result<Vec<DueCard>, StoreError> {
    let (cards, states) = store.snapshot(&ctx.user_id)?;
    let due: Vec<DueCard> = due_cards(&cards, &states, now)
        .into_iter()
        .map(|(card, state)| DueCard {
            card: card.clone(),
            state: state.cloned(),
        })
        .collect();

    debug!(
        "{} of {} cards due for user '{}'",
        due.len(),
        cards.len(),
        ctx.user_id
    );
    Ok(due)
}

pub fn progress_for_user<S: ReviewStore>(
    store: &S,
    ctx: &UserContext,
) -> Result<Vec<DailyProgress>, StoreError> {
    Ok(daily_progress(&store.review_log(&ctx.user_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::{CardStore, SqliteStore};
    use crate::error::SchedulerError;
    use chrono::{Days, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 7, 0, 0).unwrap()
    }

    fn setup() -> (SqliteStore, UserContext) {
        (SqliteStore::open_in_memory().unwrap(), UserContext::new("alice"))
    }

    #[test]
    fn test_create_card_requires_front_and_back() {
        let (store, ctx) = setup();
        assert!(matches!(
            create_card(&store, &ctx, "  ", "back", ""),
            Err(StoreError::MissingField("front"))
        ));
        assert!(matches!(
            create_card(&store, &ctx, "front", "", ""),
            Err(StoreError::MissingField("back"))
        ));

        let card = create_card(&store, &ctx, "kot", "cat", "animals, nouns").unwrap();
        assert_eq!(card.tags, vec!["animals", "nouns"]);
        assert_eq!(card.user_id, "alice");
    }

    #[test]
    fn test_review_flow_follows_schedule() {
        let (store, ctx) = setup();
        let card = create_card(&store, &ctx, "pies", "dog", "").unwrap();

        let first = record_review(&store, &ctx, card.id, 5, now()).unwrap();
        assert_eq!((first.interval, first.repetitions), (1, 1));

        let second = record_review(&store, &ctx, card.id, 4, first.next_due_at).unwrap();
        assert_eq!((second.interval, second.repetitions), (6, 2));

        let third = record_review(&store, &ctx, card.id, 5, second.next_due_at).unwrap();
        assert_eq!(third.interval, 16);

        let lapse = record_review(&store, &ctx, card.id, 0, third.next_due_at).unwrap();
        assert_eq!((lapse.interval, lapse.repetitions), (1, 0));
        assert!((lapse.ease_factor - 1.9).abs() < 1e-9);
    }

    #[test]
    fn test_returned_state_matches_stored_state() {
        let (store, ctx) = setup();
        let card = create_card(&store, &ctx, "a", "b", "").unwrap();
        let at = now() + chrono::Duration::milliseconds(750);

        let returned = record_review(&store, &ctx, card.id, 4, at).unwrap();
        let stored = store.fetch_review_state("alice", card.id).unwrap();

        assert_eq!(stored, Some(returned.clone()));
        assert_eq!(returned.last_reviewed_at, now());
    }

    #[test]
    fn test_out_of_order_duplicate_builds_on_stored_review() {
        let (store, ctx) = setup();
        let card = create_card(&store, &ctx, "a", "b", "").unwrap();
        let later = now() + chrono::Duration::seconds(1);

        record_review(&store, &ctx, card.id, 5, later).unwrap();
        let second = record_review(&store, &ctx, card.id, 5, now()).unwrap();

        assert_eq!(second.repetitions, 2);
        assert_eq!(second.interval, 6);
        assert_eq!(second.last_reviewed_at, later);
        assert_eq!(store.review_log("alice").unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_quality_is_rejected_without_writes() {
        let (store, ctx) = setup();
        let card = create_card(&store, &ctx, "a", "b", "").unwrap();

        let err = record_review(&store, &ctx, card.id, 6, now()).unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Scheduler(SchedulerError::InvalidQuality(_))
        ));
        assert!(err.is_rejected());
        assert!(store.fetch_review_state("alice", card.id).unwrap().is_none());
    }

    #[test]
    fn test_due_set_tracks_reviews() {
        let (store, ctx) = setup();
        let reviewed = create_card(&store, &ctx, "a", "b", "").unwrap();
        let fresh = create_card(&store, &ctx, "c", "d", "").unwrap();
        store.add_card("bob", "e", "f", &[]).unwrap();

        let due = due_for_user(&store, &ctx, now()).unwrap();
        assert_eq!(due.len(), 2);

        let state = record_review(&store, &ctx, reviewed.id, 4, now()).unwrap();

        let due = due_for_user(&store, &ctx, now()).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].card.id, fresh.id);
        assert!(due[0].state.is_none());

        // Due exactly at next_due_at
        let due = due_for_user(&store, &ctx, state.next_due_at).unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].card.id, reviewed.id);
        assert_eq!(due[0].state.as_ref(), Some(&state));
    }

    #[test]
    fn test_progress_groups_history() {
        let (store, ctx) = setup();
        let card = create_card(&store, &ctx, "a", "b", "").unwrap();
        record_review(&store, &ctx, card.id, 2, now()).unwrap();
        record_review(&store, &ctx, card.id, 4, now()).unwrap();
        record_review(&store, &ctx, card.id, 5, now() + Days::new(1)).unwrap();

        let progress = progress_for_user(&store, &ctx).unwrap();
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].reviews, 2);
        assert!((progress[0].average_quality - 3.0).abs() < 1e-9);
        assert_eq!(progress[1].reviews, 1);
    }
}
