//! Command implementations for the `flashcards` binary.
//! Each command runs against the store for one user at a fixed `now`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use review_scheduler::export::json::{export_json_to_path, import_json};
use review_scheduler::models::sm2::preview_intervals;
use review_scheduler::models::{Quality, Rating, ReviewState};
use review_scheduler::service::{self, UserContext};
use review_scheduler::{LearningSession, ReviewError, ReviewStore, SqliteStore};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Formats a timestamp as YYYY-MM-DD
fn format_date(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d").to_string()
}

fn describe_state(state: Option<&ReviewState>) -> String {
    match state {
        Some(s) => format!(
            "due {} (interval {}d, EF {:.2}, streak {})",
            format_date(s.next_due_at),
            s.interval,
            s.ease_factor,
            s.repetitions
        ),
        None => "new".to_string(),
    }
}

/// Bad input is reported as-is; store failures get context.
fn review_failure(err: ReviewError) -> anyhow::Error {
    if err.is_rejected() {
        anyhow::anyhow!("review rejected: {err}")
    } else {
        anyhow::Error::new(err).context("failed to record review")
    }
}

/// Accepts either a rating name or a numeric 0-5 quality.
fn parse_grade(input: &str) -> Result<Quality, String> {
    if let Ok(rating) = input.parse::<Rating>() {
        return Ok(rating.quality());
    }
    input.parse::<Quality>().map_err(|e| e.to_string())
}

pub fn add(
    store: &SqliteStore,
    ctx: &UserContext,
    front: &str,
    back: &str,
    tags: &str,
) -> Result<()> {
    let card = service::create_card(store, ctx, front, back, tags)?;
    println!("Added card {}: {} -> {}", card.id, card.front, card.back);
    Ok(())
}

pub fn list(store: &SqliteStore, ctx: &UserContext) -> Result<()> {
    let (cards, states) = store.snapshot(&ctx.user_id)?;
    if cards.is_empty() {
        println!("No cards yet. Add one with `flashcards add`.");
        return Ok(());
    }

    for card in &cards {
        let tags = if card.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", card.tags.join(", "))
        };
        println!(
            "{:>4}  {} -> {}{}  {}",
            card.id,
            card.front,
            card.back,
            tags,
            describe_state(states.get(&card.id))
        );
    }
    Ok(())
}

pub fn due(store: &SqliteStore, ctx: &UserContext, now: DateTime<Utc>) -> Result<()> {
    let due = service::due_for_user(store, ctx, now)?;
    println!("{} cards due on {}", due.len(), format_date(now));
    for item in &due {
        println!(
            "{:>4}  {}  {}",
            item.card.id,
            item.card.front,
            describe_state(item.state.as_ref())
        );
    }
    Ok(())
}

pub fn review(
    store: &SqliteStore,
    ctx: &UserContext,
    card_id: i64,
    quality: Option<&str>,
    rating: Option<Rating>,
    now: DateTime<Utc>,
) -> Result<()> {
    let quality = match (rating, quality) {
        (Some(rating), _) => rating.quality(),
        (None, Some(raw)) => raw.parse::<Quality>()?,
        (None, None) => anyhow::bail!("either a quality or --rating is required"),
    };

    let state = service::record_review(store, ctx, card_id, i64::from(quality.value()), now)
        .map_err(review_failure)?;
    println!("Card {}: {}", card_id, describe_state(Some(&state)));
    Ok(())
}

/// Interactive review of every due card, reading answers from stdin.
pub fn study(store: &SqliteStore, ctx: &UserContext, now: DateTime<Utc>) -> Result<()> {
    let due = service::due_for_user(store, ctx, now)?;
    if due.is_empty() {
        println!("Nothing due. Come back later.");
        return Ok(());
    }

    let mut session = LearningSession::new_from_due_cards(ctx.clone(), due, store);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut shown_round = 0;

    while !session.is_completed() {
        if session.round_number != shown_round {
            println!("\n{}", session.phase_message());
            shown_round = session.round_number;
        }
        let Some(card) = session.current_card() else {
            break;
        };
        let (front, back) = (card.flashcard.front.clone(), card.flashcard.back.clone());

        println!("\n{}", front);
        print!("Press enter to show the answer ");
        io::stdout().flush()?;
        if lines.next().transpose()?.is_none() {
            return Ok(());
        }

        session.toggle_back();
        println!("{}", back);

        let preview = preview_intervals(session.current_state(), now)?
            .into_iter()
            .map(|(rating, days)| format!("{} ({}d)", rating.label(), days))
            .collect::<Vec<_>>()
            .join(" | ");
        println!("{}", preview);

        loop {
            print!("Rating: ");
            io::stdout().flush()?;
            let Some(line) = lines.next().transpose()? else {
                return Ok(());
            };
            match parse_grade(&line) {
                Ok(quality) => {
                    session.grade_current_card(i64::from(quality.value()), now)?;
                    break;
                }
                Err(e) => println!("{}", e),
            }
        }

        println!("{} left in this round", session.remaining_count());
        session.next_card();
    }

    println!("\nSession complete after {} round(s).", session.round_number);
    Ok(())
}

pub fn stats(store: &SqliteStore, ctx: &UserContext) -> Result<()> {
    let progress = service::progress_for_user(store, ctx)?;
    if progress.is_empty() {
        println!("No reviews recorded yet.");
        return Ok(());
    }

    println!("{:<12} {:>8} {:>12}", "date", "reviews", "avg quality");
    for day in &progress {
        println!(
            "{:<12} {:>8} {:>12.2}",
            day.date.format("%Y-%m-%d"),
            day.reviews,
            day.average_quality
        );
    }
    Ok(())
}

pub fn export(store: &SqliteStore, ctx: &UserContext, path: &Path) -> Result<()> {
    let count = export_json_to_path(store, ctx, path)
        .with_context(|| format!("failed to export to {}", path.display()))?;
    println!("Exported {} cards to {}", count, path.display());
    Ok(())
}

pub fn import(store: &SqliteStore, ctx: &UserContext, path: &Path) -> Result<()> {
    let count = import_json(store, ctx, path)
        .with_context(|| format!("failed to import from {}", path.display()))?;
    println!("Imported {} cards from {}", count, path.display());
    Ok(())
}
