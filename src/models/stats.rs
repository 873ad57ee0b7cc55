//! Review history and the per-day progress summary built from it.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recorded review. The store appends one entry per successful review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub card_id: i64,
    pub quality: u8,
    pub ease_factor: f64,
    pub interval: i32,
    pub reviewed_at: DateTime<Utc>,
}

/// Reviews done on one calendar day (UTC) and their mean quality.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub reviews: usize,
    pub average_quality: f64,
}

/// Groups history by day, oldest day first.
pub fn daily_progress(log: &[ReviewLogEntry]) -> Vec<DailyProgress> {
    let mut by_day: BTreeMap<NaiveDate, (usize, u64)> = BTreeMap::new();
    for entry in log {
        let day = by_day.entry(entry.reviewed_at.date_naive()).or_default();
        day.0 += 1;
        day.1 += u64::from(entry.quality);
    }

    by_day
        .into_iter()
        .map(|(date, (reviews, quality_sum))| DailyProgress {
            date,
            reviews,
            average_quality: quality_sum as f64 / reviews as f64,
        })
        .collect()
}
