use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::json_io::{read_json_safe, write_json_safe};
use crate::error::Result;
use crate::types::essay_data::{CommandLogEntry, UserProfile, UserRecord};

pub type UserDirectory = BTreeMap<String, UserRecord>;

/// Profiles of everyone who talked to the bot, plus what they sent.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UserStore { path: path.into() }
    }

    pub fn load_all(&self) -> UserDirectory {
        read_json_safe(&self.path)
    }

    /// Upserts the profile and appends `command` to the user's audit trail.
    pub fn record_activity(&self, user: &UserProfile, command: &str) -> Result<()> {
        let mut users = self.load_all();
        let now = Utc::now();
        let record = users.entry(user.id.clone()).or_insert_with(|| UserRecord {
            name: String::new(),
            username: String::new(),
            first_seen: now,
            last_seen: now,
            commands: Vec::new(),
        });

        // Names can change on the platform side; keep the latest non-empty ones.
        let name = user.display_name();
        if !name.is_empty() {
            record.name = name;
        }
        if let Some(username) = user.username.as_deref().filter(|u| !u.is_empty()) {
            record.username = username.to_string();
        }
        record.last_seen = now;
        record.commands.push(CommandLogEntry { command: command.to_string(), ts: now });

        write_json_safe(&self.path, &users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_activity_creates_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path().join("users.json"));
        let user = UserProfile {
            id: "10".to_string(),
            first_name: Some("Ji".to_string()),
            last_name: Some("Min".to_string()),
            username: Some("jimin".to_string()),
        };
        store.record_activity(&user, "/essay").unwrap();

        let users = store.load_all();
        let record = &users["10"];
        assert_eq!(record.name, "Ji Min");
        assert_eq!(record.username, "jimin");
        assert_eq!(record.commands.len(), 1);
        assert_eq!(record.commands[0].command, "/essay");
        assert_eq!(record.first_seen, record.last_seen);
    }

    #[test]
    fn later_activity_appends_and_keeps_known_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path().join("users.json"));
        let named = UserProfile {
            id: "10".to_string(),
            first_name: Some("Ji".to_string()),
            ..Default::default()
        };
        store.record_activity(&named, "/essay").unwrap();
        store.record_activity(&UserProfile::anonymous("10"), "첫 문장").unwrap();

        let record = &store.load_all()["10"];
        assert_eq!(record.name, "Ji");
        assert_eq!(record.commands.len(), 2);
        assert!(record.last_seen >= record.first_seen);
    }
}
