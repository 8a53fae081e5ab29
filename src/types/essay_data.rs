use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest score a TOPIK question 54 essay can receive.
pub const MAX_SCORE: u32 = 50;

/// Outcome of scoring one essay.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreResult {
    pub score: u32,
    /// Flagged substrings, in the order the scorer reported them. Never contains "".
    pub mistakes: Vec<String>,
    pub corrected_text: String,
    pub feedback: String,
}

/// A finalized essay as handed to persistence and rendering.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EssaySubmission {
    pub user_id: String,
    pub raw_text: String,
    pub normalized_text: String,
    pub score: u32,
    pub mistakes: Vec<String>,
    pub corrected_text: String,
    pub feedback: String,
    pub timestamp: DateTime<Utc>,
}

impl EssaySubmission {
    pub fn new(user_id: &str, raw_text: &str, normalized_text: String, result: ScoreResult) -> Self {
        EssaySubmission {
            user_id: user_id.to_string(),
            raw_text: raw_text.to_string(),
            normalized_text,
            score: result.score,
            mistakes: result.mistakes,
            corrected_text: result.corrected_text,
            feedback: result.feedback,
            timestamp: Utc::now(),
        }
    }
}

/// One stored essay in a user's history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserHistory {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Who sent a message, as far as the chat platform tells us.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl UserProfile {
    pub fn anonymous(id: &str) -> Self {
        UserProfile { id: id.to_string(), ..Default::default() }
    }

    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandLogEntry {
    pub command: String,
    pub ts: DateTime<Utc>,
}

/// Audit record kept per user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub commands: Vec<CommandLogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_skips_missing_parts() {
        let mut user = UserProfile::anonymous("1");
        assert_eq!(user.display_name(), "");
        user.first_name = Some("Abdumajid".to_string());
        assert_eq!(user.display_name(), "Abdumajid");
        user.last_name = Some("K".to_string());
        assert_eq!(user.display_name(), "Abdumajid K");
    }

    #[test]
    fn history_entry_without_score_deserializes() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"text":"글","updated_at":"2025-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(entry.score, None);
        assert_eq!(entry.text, "글");
    }
}
