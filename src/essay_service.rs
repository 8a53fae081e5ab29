use crate::config::Config;
use crate::error::{EssayError, Result};
use crate::render::{Renderer, SheetRenderer};
use crate::scoring::FallbackScorer;
use crate::sheet::{count_squares, locate, normalize, GridSpec, HighlightSet};
use crate::storage::EssayStore;
use crate::types::essay_data::{EssaySubmission, MAX_SCORE};

/// Everything the chat layer needs to answer a finished essay.
#[derive(Debug, Clone)]
pub struct FinalizedEssay {
    pub submission: EssaySubmission,
    pub highlights: HighlightSet,
    pub image_png: Vec<u8>,
    pub caption: String,
}

pub fn build_caption(squares: usize, score: u32, feedback: &str) -> String {
    format!(
        "📄 작성 완료!\n총 칸: {}\n예상 점수: {}/{}\n\n💡 Feedback:\n{}",
        squares, score, MAX_SCORE, feedback
    )
}

/// Scores, normalizes, stores and renders finished essays.
pub struct EssayService {
    grid: GridSpec,
    scorer: FallbackScorer,
    renderer: Box<dyn Renderer + Send + Sync>,
    essays: EssayStore,
}

impl EssayService {
    pub fn new(
        grid: GridSpec,
        scorer: FallbackScorer,
        renderer: Box<dyn Renderer + Send + Sync>,
        essays: EssayStore,
    ) -> Self {
        EssayService { grid, scorer, renderer, essays }
    }

    /// Production wiring: configured scorer, font-backed sheet renderer, JSON archive.
    pub fn from_config(config: &Config) -> Self {
        let grid = config.grid_spec();
        Self::new(
            grid,
            FallbackScorer::from_config(config),
            Box::new(SheetRenderer::with_font(grid, config.render.font_path.as_deref())),
            EssayStore::new(config.essays_path()),
        )
    }

    pub fn essays(&self) -> &EssayStore {
        &self.essays
    }

    pub fn finalize(&self, user_id: &str, raw_text: &str) -> Result<FinalizedEssay> {
        if raw_text.trim().is_empty() {
            return Err(EssayError::EmptyEssay);
        }

        let result = self.scorer.evaluate(raw_text);
        let normalized = normalize(&result.corrected_text);

        let highlights = locate(&normalized, &result.mistakes, self.grid.cols, self.grid.rows);
        let image_png = self.renderer.render(&normalized, &highlights)?;

        // Only rendered essays are archived. A failed write must not cost the student their sheet.
        if let Err(e) = self.essays.save_essay(user_id, &normalized, Some(result.score)) {
            tracing::warn!("Could not persist essay for user {}: {}", user_id, e);
        }

        let squares = count_squares(&normalized);
        if squares > self.grid.capacity() {
            tracing::debug!(
                "Essay for user {} uses {} cells, sheet holds {}",
                user_id,
                squares,
                self.grid.capacity()
            );
        }
        let caption = build_caption(squares, result.score, &result.feedback);

        tracing::info!(
            "Finalized essay for user {}: score {}/{}, {} mistakes, {} highlighted cells",
            user_id,
            result.score,
            MAX_SCORE,
            result.mistakes.len(),
            highlights.len()
        );

        let submission = EssaySubmission::new(user_id, raw_text, normalized, result);
        Ok(FinalizedEssay { submission, highlights, image_png, caption })
    }
}
