mod app;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{debug, info};
use review_scheduler::{Config, Rating, SqliteStore, UserContext};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flashcards", version, about = "Spaced repetition flashcards")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// User to act as (overrides the config)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Treat this RFC 3339 timestamp as the current time
    #[arg(long, global = true)]
    at: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a card
    Add {
        #[arg(long)]
        front: String,

        #[arg(long)]
        back: String,

        /// Comma separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },

    /// List all cards with their schedule
    List,

    /// Show the cards due now
    Due,

    /// Record a review of one card
    Review {
        card_id: i64,

        /// Quality 0-5
        #[arg(required_unless_present = "rating")]
        quality: Option<String>,

        /// forgot, hard, good or easy
        #[arg(long, conflicts_with = "quality")]
        rating: Option<Rating>,
    },

    /// Review every due card interactively
    Study,

    /// Reviews per day and their average quality
    Stats,

    /// Export cards and review state to JSON
    Export { path: PathBuf },

    /// Import cards and review state from JSON
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter))
        .init();
    debug!("Loaded config: {:?}", config);

    let db_path = cli.db.unwrap_or(config.database_path);
    let store = SqliteStore::open(&db_path)?;
    let ctx = UserContext::new(cli.user.unwrap_or(config.user_id));
    let now = cli.at.unwrap_or_else(Utc::now);
    info!("Acting as user '{}' at {}", ctx.user_id, now);

    match cli.command {
        Commands::Add { front, back, tags } => app::add(&store, &ctx, &front, &back, &tags),
        Commands::List => app::list(&store, &ctx),
        Commands::Due => app::due(&store, &ctx, now),
        Commands::Review {
            card_id,
            quality,
            rating,
        } => app::review(&store, &ctx, card_id, quality.as_deref(), rating, now),
        Commands::Study => app::study(&store, &ctx, now),
        Commands::Stats => app::stats(&store, &ctx),
        Commands::Export { path } => app::export(&store, &ctx, &path),
        Commands::Import { path } => app::import(&store, &ctx, &path),
    }
}
