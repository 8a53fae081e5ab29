use std::collections::BTreeSet;
use std::fmt::Write;

use crate::config::Config;
use crate::error::{EssayError, Result};
use crate::storage::{EssayStore, UserStore};
use crate::types::essay_data::{HistoryEntry, MAX_SCORE};

pub const PREVIEW_CHARS: usize = 300;
pub const MESSAGE_CHUNK_CHARS: usize = 4000;
pub const NO_USERS_MESSAGE: &str = "No users have interacted yet.";

/// Admin-only overview of users and their essays.
pub struct AdminDashboard<'a> {
    config: &'a Config,
    essays: &'a EssayStore,
    users: &'a UserStore,
}

impl<'a> AdminDashboard<'a> {
    pub fn new(config: &'a Config, essays: &'a EssayStore, users: &'a UserStore) -> Self {
        AdminDashboard { config, essays, users }
    }

    /// Builds the report as message-sized chunks.
    pub fn report(&self, requester: &str) -> Result<Vec<String>> {
        if !self.config.is_admin(requester) {
            tracing::warn!("User {} requested the admin dashboard without permission", requester);
            return Err(EssayError::Unauthorized);
        }

        let users = self.users.load_all();
        let mut essays = self.essays.load_all();
        if users.is_empty() && essays.is_empty() {
            return Ok(vec![NO_USERS_MESSAGE.to_string()]);
        }

        let ids: BTreeSet<String> = users.keys().chain(essays.keys()).cloned().collect();
        let mut report = String::from("🛡️ Admin Dashboard 🛡️\n\n");
        for id in ids {
            let (name, username) = users
                .get(&id)
                .map(|u| (u.name.as_str(), u.username.as_str()))
                .unwrap_or(("N/A", ""));
            let _ = writeln!(report, "👤 {} (@{}) ID: {}", name, username, id);

            let history = essays.remove(&id).map(|h| h.history).unwrap_or_default();
            if history.is_empty() {
                report.push_str("   ✏️ No essays submitted yet.\n");
            }
            for (idx, entry) in history.iter().enumerate() {
                let _ = writeln!(report, "   ✏️ Essay {} {}", idx + 1, describe(entry));
            }
            report.push('\n');
        }

        Ok(chunk_message(&report, MESSAGE_CHUNK_CHARS))
    }
}

fn describe(entry: &HistoryEntry) -> String {
    let score = entry
        .score
        .map(|s| format!("{}/{}", s, MAX_SCORE))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "[{}] ({}): {}",
        entry.updated_at.format("%Y-%m-%d %H:%M:%S"),
        score,
        preview(&entry.text, PREVIEW_CHARS)
    )
}

pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Splits on char boundaries so no chunk exceeds `max_chars` characters.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max_chars).map(|c| c.iter().collect()).collect()
}
