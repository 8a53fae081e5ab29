use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::json_io::{read_json_safe, write_json_safe};
use crate::error::Result;
use crate::types::essay_data::{HistoryEntry, UserHistory};

pub type EssayArchive = BTreeMap<String, UserHistory>;

/// Append-only essay history, one JSON file keyed by user id.
#[derive(Debug, Clone)]
pub struct EssayStore {
    path: PathBuf,
}

impl EssayStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EssayStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_all(&self) -> EssayArchive {
        read_json_safe(&self.path)
    }

    pub fn history(&self, user_id: &str) -> Vec<HistoryEntry> {
        self.load_all()
            .remove(user_id)
            .map(|user| user.history)
            .unwrap_or_default()
    }

    pub fn save_essay(&self, user_id: &str, text: &str, score: Option<u32>) -> Result<()> {
        let mut archive = self.load_all();
        archive
            .entry(user_id.to_string())
            .or_default()
            .history
            .push(HistoryEntry { text: text.to_string(), score, updated_at: Utc::now() });
        write_json_safe(&self.path, &archive)?;
        tracing::debug!("Saved essay for user {} to {}", user_id, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn history_accumulates_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = EssayStore::new(dir.path().join("essays.json"));
        store.save_essay("1", "첫 글", Some(11)).unwrap();
        store.save_essay("1", "둘째 글", Some(20)).unwrap();
        store.save_essay("2", "다른 사람", None).unwrap();

        let first = store.history("1");
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].text, "첫 글");
        assert_eq!(first[1].score, Some(20));
        assert_eq!(store.history("2")[0].score, None);
        assert!(store.history("3").is_empty());
        assert_eq!(store.load_all().len(), 2);
    }

    #[test]
    fn corrupt_archive_starts_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essays.json");
        fs::write(&path, "[[[").unwrap();
        let store = EssayStore::new(&path);
        store.save_essay("7", "새 글", Some(5)).unwrap();
        assert_eq!(store.history("7").len(), 1);
        assert!(dir.path().join("essays.json.bak").exists());
    }

    #[test]
    fn file_layout_uses_history_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = EssayStore::new(dir.path().join("essays.json"));
        store.save_essay("9", "글", Some(1)).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["9"]["history"][0]["text"], "글");
        assert_eq!(raw["9"]["history"][0]["score"], 1);
    }
}
