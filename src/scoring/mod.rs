pub mod external;
pub mod heuristic;

pub use external::ExternalScorer;
pub use heuristic::HeuristicScorer;

use crate::config::Config;
use crate::error::Result;
use crate::types::essay_data::{ScoreResult, MAX_SCORE};

/// Anything that can grade an essay.
pub trait Scorer {
    fn name(&self) -> &str;
    fn score(&self, text: &str) -> Result<ScoreResult>;
}

/// Tries the primary scorer and falls back to the heuristic on any failure,
/// so grading never fails toward the caller.
pub struct FallbackScorer {
    primary: Option<Box<dyn Scorer + Send + Sync>>,
    heuristic: HeuristicScorer,
}

impl FallbackScorer {
    pub fn heuristic_only() -> Self {
        FallbackScorer { primary: None, heuristic: HeuristicScorer::new() }
    }

    pub fn with_primary(primary: Box<dyn Scorer + Send + Sync>) -> Self {
        FallbackScorer { primary: Some(primary), heuristic: HeuristicScorer::new() }
    }

    /// External scorer when an API key is available, otherwise heuristic only.
    pub fn from_config(config: &Config) -> Self {
        let Some(api_key) = config.external_api_key() else {
            tracing::info!("External scorer disabled, using heuristic scoring");
            return Self::heuristic_only();
        };
        match ExternalScorer::new(&config.scorer, api_key) {
            Ok(external) => Self::with_primary(Box::new(external)),
            Err(e) => {
                tracing::warn!("Could not build external scorer ({}), using heuristic scoring", e);
                Self::heuristic_only()
            }
        }
    }

    pub fn evaluate(&self, text: &str) -> ScoreResult {
        if let Some(primary) = &self.primary {
            match primary.score(text) {
                Ok(result) if is_well_formed(&result) => return result,
                Ok(result) => tracing::warn!(
                    "{} scorer returned an invalid result (score {}), falling back",
                    primary.name(),
                    result.score
                ),
                Err(e) => tracing::warn!("{} scorer failed: {}; falling back", primary.name(), e),
            }
        }
        self.heuristic.evaluate(text)
    }
}

fn is_well_formed(result: &ScoreResult) -> bool {
    result.score <= MAX_SCORE && result.mistakes.iter().all(|m| !m.is_empty())
}

impl Scorer for FallbackScorer {
    fn name(&self) -> &str {
        "fallback"
    }

    fn score(&self, text: &str) -> Result<ScoreResult> {
        Ok(self.evaluate(text))
    }
}
