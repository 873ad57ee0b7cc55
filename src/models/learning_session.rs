//! Learning session management for spaced repetition practice.
//! Walks through the due cards in rounds, grading each one through the SM-2 scheduler.

use super::{LearningCard, ReviewState};
use crate::database::store::ReviewStore;
use crate::error::ReviewError;
use crate::service::{self, DueCard, UserContext};
use chrono::{DateTime, Utc};

/// Manages a learning session with multiple review rounds.
/// Cards that aren't passed (grade < 3) are repeated in subsequent rounds.
pub struct LearningSession<'s, S: ReviewStore> {
    pub ctx: UserContext,
    pub all_cards: Vec<(LearningCard, Option<ReviewState>)>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_back: bool,
    pub round_number: usize,
    store: &'s S,
}

impl<'s, S: ReviewStore> LearningSession<'s, S> {
    /// Creates a new learning session from cards that are due for review.
    pub fn new_from_due_cards(ctx: UserContext, cards: Vec<DueCard>, store: &'s S) -> Self {
        let learning_cards: Vec<_> = cards
            .into_iter()
            .map(|due| (LearningCard::new(due.card), due.state))
            .collect();

        let indices: Vec<usize> = (0..learning_cards.len()).collect();

        Self {
            ctx,
            all_cards: learning_cards,
            current_round_cards: indices,
            current_index: 0,
            show_back: false,
            round_number: 1,
            store,
        }
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx).map(|(card, _)| card))
    }

    pub fn current_state(&self) -> Option<&ReviewState> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
            .and_then(|(_, state)| state.as_ref())
    }

    pub fn toggle_back(&mut self) {
        self.show_back = !self.show_back;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_back = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that weren't passed.
    /// If every card passed, the session is complete.
    fn start_next_round(&mut self) {
        let failed_indices: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| {
                self.all_cards
                    .get(idx)
                    .map(|(card, _)| !card.is_learned)
                    .unwrap_or(false)
            })
            .collect();

        if !failed_indices.is_empty() {
            self.current_round_cards = failed_indices;
            self.current_index = 0;
            self.show_back = false;
            self.round_number += 1;
        }
    }

    /// Grades the current card, persists the new state and keeps it in memory.
    /// Cards with grade >= 3 are marked as learned for this session.
    pub fn grade_current_card(
        &mut self,
        quality: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewState>, ReviewError> {
        let Some(&actual_idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(None);
        };
        let Some((card, review_state)) = self.all_cards.get_mut(actual_idx) else {
            return Ok(None);
        };

        let new_state =
            service::record_review(self.store, &self.ctx, card.flashcard.id, quality, now)?;

        if quality >= 3 {
            card.mark_as_learned();
        } else {
            card.is_learned = false;
        }
        *review_state = Some(new_state.clone());

        Ok(Some(new_state))
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| {
                self.all_cards
                    .get(idx)
                    .map(|(card, _)| card.is_learned)
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// Returns true when the round is empty or every card in it was passed.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.learned_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
