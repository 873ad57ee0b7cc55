pub mod due;
pub mod flashcard;
pub mod learning_card;
pub mod learning_session;
pub mod quality;
pub mod review_state;
pub mod sm2;
pub mod stats;

pub use due::{due_cards, is_due};
pub use flashcard::{Flashcard, parse_tags};
pub use learning_card::LearningCard;
pub use learning_session::LearningSession;
pub use quality::{Quality, Rating};
pub use review_state::ReviewState;
pub use sm2::compute_next;
pub use stats::{DailyProgress, ReviewLogEntry, daily_progress};
