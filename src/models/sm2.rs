//! SM-2 (SuperMemo 2) spaced repetition scheduling.
//!
//! The scheduler turns the prior review state of a card and the quality of the
//! review that just happened into the next review state:
//! - Quality grades 0-2: repetitions reset to 0 and the card comes back tomorrow
//! - Quality grades 3-5: interval grows 1 day → 6 days → previous interval × EF
//! - EF is adjusted after every review, in both branches, and never drops below 1.3
//!
//! The computation is pure. Persisting the result is up to the caller.

use super::quality::{Quality, Rating};
use super::review_state::{
    DEFAULT_EASE_FACTOR, DEFAULT_INTERVAL_DAYS, MIN_EASE_FACTOR, ReviewState,
};
use crate::error::SchedulerError;
use chrono::{DateTime, Days, Utc};

/// Computes the next review state from a raw integer quality.
///
/// `prior` is `None` for a card that has never been reviewed, in which case the
/// default state (EF 2.5, interval 1, repetitions 0) is used.
pub fn compute_next(
    prior: Option<&ReviewState>,
    quality: i64,
    now: DateTime<Utc>,
) -> Result<ReviewState, SchedulerError> {
    schedule(prior, Quality::new(quality)?, now)
}

/// Computes the next review state from an already validated quality.
///
/// A grown interval that does not fit in `i32`, or a due date chrono cannot
/// represent, is reported as `InvalidPriorState`.
pub fn schedule(
    prior: Option<&ReviewState>,
    quality: Quality,
    now: DateTime<Utc>,
) -> Result<ReviewState, SchedulerError> {
    let (ease_factor, interval, repetitions) = match prior {
        Some(state) => {
            state.validate()?;
            if now < state.last_reviewed_at {
                return Err(SchedulerError::InvalidPriorState(
                    "last review is later than the current review",
                ));
            }
            (state.ease_factor, state.interval, state.repetitions)
        }
        None => (DEFAULT_EASE_FACTOR, DEFAULT_INTERVAL_DAYS, 0),
    };

    let (new_interval, new_repetitions) = if quality.is_pass() {
        let next = match repetitions {
            0 => 1,
            1 => 6,
            // Grows from the EF the card had before this review
            _ => {
                let grown = (interval as f64 * ease_factor).round();
                i32::try_from(grown as i64).map_err(|_| {
                    SchedulerError::InvalidPriorState("next interval out of range")
                })?
            }
        };
        (next, repetitions.saturating_add(1))
    } else {
        (1, 0)
    };

    let q = quality.value() as f64;
    let adjustment = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
    let new_ease_factor = (ease_factor + adjustment).max(MIN_EASE_FACTOR);

    // Calendar days, so month and year boundaries roll over correctly
    let next_due_at = now
        .checked_add_days(Days::new(new_interval as u64))
        .ok_or(SchedulerError::InvalidPriorState(
            "next due date out of range",
        ))?;

    Ok(ReviewState {
        ease_factor: new_ease_factor,
        interval: new_interval,
        repetitions: new_repetitions,
        last_reviewed_at: now,
        next_due_at,
        quality: quality.value(),
    })
}

/// Interval each rating button would produce, for showing next to the buttons.
pub fn preview_intervals(
    prior: Option<&ReviewState>,
    now: DateTime<Utc>,
) -> Result<Vec<(Rating, i32)>, SchedulerError> {
    Rating::ALL
        .into_iter()
        .map(|rating| schedule(prior, rating.quality(), now).map(|s| (rating, s.interval)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EPS: f64 = 1e-9;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap()
    }

    fn prior(ease_factor: f64, interval: i32, repetitions: i32) -> ReviewState {
        let reviewed = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
        ReviewState {
            ease_factor,
            interval,
            repetitions,
            last_reviewed_at: reviewed,
            next_due_at: reviewed + Days::new(interval as u64),
            quality: 4,
        }
    }

    #[test]
    fn test_first_review_perfect() {
        let next = compute_next(Some(&prior(2.5, 1, 0)), 5, now()).unwrap();
        assert!((next.ease_factor - 2.6).abs() < EPS);
        assert_eq!(next.interval, 1);
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.quality, 5);
    }

    #[test]
    fn test_second_review_good() {
        let next = compute_next(Some(&prior(2.6, 1, 1)), 4, now()).unwrap();
        assert!((next.ease_factor - 2.6).abs() < EPS);
        assert_eq!(next.interval, 6);
        assert_eq!(next.repetitions, 2);
    }

    #[test]
    fn test_third_review_uses_prior_ease() {
        let next = compute_next(Some(&prior(2.6, 6, 2)), 5, now()).unwrap();
        assert!((next.ease_factor - 2.7).abs() < EPS);
        // round(6 × 2.6) = round(15.6)
        assert_eq!(next.interval, 16);
        assert_eq!(next.repetitions, 3);
    }

    #[test]
    fn test_blackout_resets_and_penalizes() {
        let next = compute_next(Some(&prior(2.7, 16, 3)), 0, now()).unwrap();
        assert!((next.ease_factor - 1.9).abs() < EPS);
        assert_eq!(next.interval, 1);
        assert_eq!(next.repetitions, 0);
    }

    #[test]
    fn test_never_reviewed_uses_default_state() {
        let next = compute_next(None, 3, now()).unwrap();
        assert!((next.ease_factor - 2.36).abs() < EPS);
        assert_eq!(next.interval, 1);
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.last_reviewed_at, now());
        assert_eq!(next.next_due_at, now() + Days::new(1));
    }

    #[test]
    fn test_success_ladder_from_default() {
        let mut state: Option<ReviewState> = None;
        let mut intervals = Vec::new();
        let mut at = now();
        for _ in 0..5 {
            let next = compute_next(state.as_ref(), 5, at).unwrap();
            intervals.push(next.interval);
            at = next.next_due_at;
            state = Some(next);
        }
        // Each growth step uses the EF before that review: 2.7, 2.8, 2.9
        // 16 = round(6 × 2.7), 45 = round(16 × 2.8), 131 = round(45 × 2.9)
        assert_eq!(intervals, vec![1, 6, 16, 45, 131]);
        assert_eq!(state.unwrap().repetitions, 5);
    }

    #[test]
    fn test_failure_resets_any_streak() {
        for reps in 1..20 {
            for quality in 0..3 {
                let next = compute_next(Some(&prior(2.2, 40, reps)), quality, now()).unwrap();
                assert_eq!(next.repetitions, 0);
                assert_eq!(next.interval, 1);
            }
        }
    }

    #[test]
    fn test_floors_hold_for_all_inputs() {
        let eases = [1.3, 1.31, 1.5, 2.0, 2.5, 3.7];
        let intervals = [1, 2, 6, 15, 365];
        for &ease in &eases {
            for &interval in &intervals {
                for reps in 0..4 {
                    for quality in 0..=5 {
                        let next =
                            compute_next(Some(&prior(ease, interval, reps)), quality, now())
                                .unwrap();
                        assert!(next.ease_factor >= MIN_EASE_FACTOR);
                        assert!(next.interval >= 1);
                        assert!(next.repetitions >= 0);
                        assert!(next.next_due_at > next.last_reviewed_at);
                    }
                }
            }
        }
    }

    #[test]
    fn test_ease_floor_at_minimum() {
        let next = compute_next(Some(&prior(1.3, 1, 1)), 0, now()).unwrap();
        assert_eq!(next.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let p = prior(2.1, 9, 4);
        let first = compute_next(Some(&p), 4, now()).unwrap();
        let second = compute_next(Some(&p), 4, now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_due_date_crosses_month_and_year() {
        let new_year_eve = Utc.with_ymd_and_hms(2023, 12, 30, 22, 15, 0).unwrap();
        let reviewed = Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap();
        let p = ReviewState {
            ease_factor: 2.5,
            interval: 1,
            repetitions: 1,
            last_reviewed_at: reviewed,
            next_due_at: reviewed + Days::new(1),
            quality: 4,
        };
        let next = compute_next(Some(&p), 4, new_year_eve).unwrap();
        assert_eq!(
            next.next_due_at,
            Utc.with_ymd_and_hms(2024, 1, 5, 22, 15, 0).unwrap()
        );

        let leap = Utc.with_ymd_and_hms(2024, 2, 28, 12, 0, 0).unwrap();
        let next = compute_next(None, 5, leap).unwrap();
        assert_eq!(
            next.next_due_at,
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_interval_ties_round_away_from_zero() {
        // 5 × 2.5 = 12.5
        let next = compute_next(Some(&prior(2.5, 5, 2)), 4, now()).unwrap();
        assert_eq!(next.interval, 13);

        // 3 × 1.5 = 4.5
        let next = compute_next(Some(&prior(1.5, 3, 2)), 4, now()).unwrap();
        assert_eq!(next.interval, 5);
    }

    fn long_interval_prior(ease_factor: f64, interval: i32) -> ReviewState {
        let reviewed = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
        ReviewState {
            ease_factor,
            interval,
            repetitions: 3,
            last_reviewed_at: reviewed,
            next_due_at: reviewed,
            quality: 5,
        }
    }

    #[test]
    fn test_interval_overflow_is_reported() {
        let next = compute_next(Some(&long_interval_prior(3.0, i32::MAX / 2)), 5, now());
        assert_eq!(
            next,
            Err(SchedulerError::InvalidPriorState("next interval out of range"))
        );

        // Fits in i32 but lies past the last date chrono can represent
        let next = compute_next(Some(&long_interval_prior(2.5, 400_000_000)), 5, now());
        assert_eq!(
            next,
            Err(SchedulerError::InvalidPriorState("next due date out of range"))
        );
    }

    #[test]
    fn test_review_before_last_review_rejected() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            compute_next(Some(&prior(2.5, 1, 1)), 4, earlier),
            Err(SchedulerError::InvalidPriorState(_))
        ));
    }

    #[test]
    fn test_invalid_quality_rejected() {
        assert_eq!(
            compute_next(None, 6, now()),
            Err(SchedulerError::InvalidQuality("6".to_string()))
        );
        assert!(compute_next(None, -1, now()).is_err());
    }

    #[test]
    fn test_invalid_prior_rejected() {
        assert!(matches!(
            compute_next(Some(&prior(1.2, 1, 0)), 4, now()),
            Err(SchedulerError::InvalidPriorState(_))
        ));
        assert!(matches!(
            compute_next(Some(&prior(2.5, 0, 0)), 4, now()),
            Err(SchedulerError::InvalidPriorState(_))
        ));
        assert!(matches!(
            compute_next(Some(&prior(2.5, 1, -3)), 4, now()),
            Err(SchedulerError::InvalidPriorState(_))
        ));
    }

    #[test]
    fn test_preview_intervals() {
        let preview = preview_intervals(Some(&prior(2.5, 6, 2)), now()).unwrap();
        assert_eq!(
            preview,
            vec![
                (Rating::Forgot, 1),
                (Rating::Hard, 15),
                (Rating::Good, 15),
                (Rating::Easy, 15),
            ]
        );
    }
}
