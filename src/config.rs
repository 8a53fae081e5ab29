use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EssayError, Result};
use crate::sheet::GridSpec;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub admin_ids: Vec<String>,
    pub grid: GridConfig,
    pub scorer: ScorerConfig,
    pub render: RenderConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ScorerConfig {
    pub use_external: bool,
    pub model: String,
    pub endpoint: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

/// Sheet drawing options. Without a usable `font_path` the renderer looks for a
/// system Hangul font and then falls back to its bitmap font.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct RenderConfig {
    pub font_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            admin_ids: Vec::new(),
            grid: GridConfig::default(),
            scorer: ScorerConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        let spec = GridSpec::default();
        GridConfig { rows: spec.rows, cols: spec.cols }
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        ScorerConfig {
            use_external: true,
            model: "gpt-4.1".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            max_tokens: 1500,
        }
    }
}

impl Config {
    pub fn grid_spec(&self) -> GridSpec {
        GridSpec { rows: self.grid.rows, cols: self.grid.cols }
    }

    pub fn essays_path(&self) -> PathBuf {
        self.data_dir.join("essays.json")
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn grammar_path(&self) -> PathBuf {
        self.data_dir.join("grammar.json")
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == user_id)
    }

    /// API key for the external scorer, if the external strategy is enabled at all.
    /// `USE_DUMMY_AI=1` forces the heuristic path.
    pub fn external_api_key(&self) -> Option<String> {
        if !self.scorer.use_external {
            return None;
        }
        if std::env::var("USE_DUMMY_AI").map(|v| v == "1").unwrap_or(false) {
            return None;
        }
        std::env::var(&self.scorer.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    fn validate(self) -> Result<Self> {
        if self.grid.rows == 0 || self.grid.cols == 0 {
            return Err(EssayError::Config(format!(
                "grid must have at least one row and column (got {}x{})",
                self.grid.rows, self.grid.cols
            )));
        }
        Ok(self)
    }
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let loaded: Config = toml::from_str(contents)?;
    loaded.validate()
}

/// Loads the TOML config. A missing file means defaults; a malformed one is an error.
pub fn load_config_from_file(file_path: &Path) -> Result<Config> {
    match fs::read_to_string(file_path) {
        Ok(contents) => parse_config(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config at {}, using defaults", file_path.display());
            Ok(Config::default())
        }
        Err(e) => Err(EssayError::Io(e)),
    }
}
