use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const PER_PAGE: usize = 5;
const UNRANKED: u32 = 9999;

/// One grammar pattern from the TOPIK writing inventory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GrammarEntry {
    #[serde(default)]
    pub pattern: String,
    #[serde(default = "default_function")]
    pub function: String,
    #[serde(default)]
    pub levels: Vec<String>,
    #[serde(default)]
    pub meaning_en: String,
    #[serde(default)]
    pub meaning_uz: String,
    #[serde(default)]
    pub example_kr: String,
    #[serde(default)]
    pub frequency_rank: Option<u32>,
}

fn default_function() -> String {
    "Other".to_string()
}

impl GrammarEntry {
    fn sort_key(&self) -> (u32, &str) {
        (self.frequency_rank.unwrap_or(UNRANKED), self.pattern.as_str())
    }

    /// Multi-line card shown in chat and on the CLI.
    pub fn render(&self) -> String {
        format!(
            "{}\n레벨: {}\n예문: {}\nEN: {}\nUZ: {}",
            self.pattern,
            self.levels.join(","),
            self.example_kr,
            self.meaning_en,
            self.meaning_uz
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GrammarFile {
    List(Vec<GrammarEntry>),
    Wrapped { entries: Vec<GrammarEntry> },
}

fn entry(pattern: &str, function: &str, levels: &[&str], en: &str, uz: &str, example: &str, rank: u32) -> GrammarEntry {
    GrammarEntry {
        pattern: pattern.to_string(),
        function: function.to_string(),
        levels: levels.iter().map(|l| l.to_string()).collect(),
        meaning_en: en.to_string(),
        meaning_uz: uz.to_string(),
        example_kr: example.to_string(),
        frequency_rank: Some(rank),
    }
}

pub fn sample_entries() -> Vec<GrammarEntry> {
    vec![
        entry(
            "-(으)므로",
            "Cause/Effect",
            &["5-6"],
            "because / since (formal)",
            "chunki (formal)",
            "그는 아팠으므로 결석했습니다.",
            120,
        ),
        entry(
            "-(으)니까",
            "Cause/Effect",
            &["3-4", "5-6"],
            "because / so",
            "chunki / shuning uchun",
            "비가 오니까 우산을 가져오세요.",
            80,
        ),
        entry(
            "-지만",
            "Contrast/Concession",
            &["3-4", "5-6"],
            "but / however",
            "ammo",
            "좋아하지만 살 시간이 없다.",
            60,
        ),
    ]
}

/// Read-only grammar inventory.
#[derive(Debug, Clone)]
pub struct GrammarDb {
    entries: Vec<GrammarEntry>,
}

impl GrammarDb {
    pub fn new(entries: Vec<GrammarEntry>) -> Self {
        GrammarDb { entries }
    }

    pub fn with_samples() -> Self {
        Self::new(sample_entries())
    }

    /// Loads the inventory, falling back to the bundled samples when the file
    /// is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No grammar file at {}, using samples", path.display());
            return Self::with_samples();
        }
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|contents| serde_json::from_str::<GrammarFile>(&contents).map_err(|e| e.to_string()));
        match parsed {
            Ok(GrammarFile::List(entries)) | Ok(GrammarFile::Wrapped { entries }) => {
                tracing::info!("Loaded {} grammar entries from {}", entries.len(), path.display());
                Self::new(entries)
            }
            Err(e) => {
                tracing::warn!("Could not read grammar file {}: {}; using samples", path.display(), e);
                Self::with_samples()
            }
        }
    }

    pub fn entries(&self) -> &[GrammarEntry] {
        &self.entries
    }

    pub fn list_functions(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.entries.iter().map(|e| e.function.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn list_levels(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.entries.iter().flat_map(|e| e.levels.iter().map(String::as_str)).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Entries matching every given criterion, most frequent first.
    pub fn filter(&self, function: Option<&str>, level: Option<&str>, keyword: Option<&str>) -> Vec<&GrammarEntry> {
        let keyword = keyword.map(str::to_lowercase).filter(|k| !k.is_empty());
        let mut matches: Vec<&GrammarEntry> = self
            .entries
            .iter()
            .filter(|e| function.map_or(true, |f| e.function == f))
            .filter(|e| level.map_or(true, |l| e.levels.iter().any(|lvl| lvl == l)))
            .filter(|e| {
                keyword.as_deref().map_or(true, |k| {
                    e.pattern.to_lowercase().contains(k) || e.example_kr.to_lowercase().contains(k)
                })
            })
            .collect();
        matches.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        matches
    }
}

/// Returns the 1-based `page` and the total number of entries.
pub fn paginate<T>(entries: &[T], page: usize, per_page: usize) -> (&[T], usize) {
    let total = entries.len();
    let start = page.saturating_sub(1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);
    (&entries[start..end], total)
}
