//! Flashcard is a pair <front, back> owned by a user, with optional tags.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    pub user_id: String,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Splits a comma separated tag list, trimming each tag and dropping empty ones.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            parse_tags(" verbs, polish ,,food "),
            vec!["verbs", "polish", "food"]
        );
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ").is_empty());
    }

    #[test]
    fn test_flashcard_json_shape() {
        let json = r#"{
            "id": 3,
            "user_id": "u1",
            "front": "cześć",
            "back": "hello",
            "created_at": "2024-01-02T03:04:05Z"
        }"#;

        let card: Flashcard = serde_json::from_str(json).unwrap();
        assert_eq!(card.front, "cześć");
        assert_eq!(card.back, "hello");
        assert!(card.tags.is_empty());
    }
}
