use essay_sheet::error::Result;
use essay_sheet::render::sheet_image::{CELL_SIZE, MISTAKE_INK};
use essay_sheet::render::SheetRenderer;
use essay_sheet::scoring::{FallbackScorer, Scorer};
use essay_sheet::sheet::{CellCoordinate, GridSpec};
use essay_sheet::storage::EssayStore;
use essay_sheet::{EssayError, EssayService, ScoreResult};

struct FixedScorer(ScoreResult);

impl Scorer for FixedScorer {
    fn name(&self) -> &str {
        "fixed"
    }

    fn score(&self, _text: &str) -> Result<ScoreResult> {
        Ok(self.0.clone())
    }
}

fn service_with(dir: &tempfile::TempDir, result: ScoreResult) -> EssayService {
    let grid = GridSpec::default();
    EssayService::new(
        grid,
        FallbackScorer::with_primary(Box::new(FixedScorer(result))),
        Box::new(SheetRenderer::new(grid)),
        EssayStore::new(dir.path().join("essays.json")),
    )
}

fn red_pixels_in(img: &image::RgbaImage, renderer: &SheetRenderer, cell: CellCoordinate) -> usize {
    let (x0, y0) = renderer.cell_origin(cell);
    let mut count = 0;
    for y in y0 + 1..y0 + CELL_SIZE - 1 {
        for x in x0 + 1..x0 + CELL_SIZE - 1 {
            if *img.get_pixel(x, y) == MISTAKE_INK {
                count += 1;
            }
        }
    }
    count
}

#[test]
fn finalize_produces_png_with_highlighted_cells() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(
        &dir,
        ScoreResult {
            score: 27,
            mistakes: vec!["나다".to_string()],
            corrected_text: "가나다라마".to_string(),
            feedback: "조사를 확인하세요.".to_string(),
        },
    );

    let done = service.finalize("7", "가나다라마").unwrap();
    assert_eq!(
        done.highlights.to_sorted_vec(),
        vec![CellCoordinate::new(0, 1), CellCoordinate::new(0, 2)]
    );

    let renderer = SheetRenderer::new(GridSpec::default());
    let decoded = image::load_from_memory(&done.image_png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), renderer.image_size());
    assert!(red_pixels_in(&decoded, &renderer, CellCoordinate::new(0, 1)) > 0);
    assert!(red_pixels_in(&decoded, &renderer, CellCoordinate::new(0, 2)) > 0);
    assert_eq!(red_pixels_in(&decoded, &renderer, CellCoordinate::new(0, 0)), 0);
    assert_eq!(red_pixels_in(&decoded, &renderer, CellCoordinate::new(0, 3)), 0);

    assert!(done.caption.contains("총 칸: 5"));
    assert!(done.caption.contains("예상 점수: 27/50"));
    assert_eq!(EssayStore::new(dir.path().join("essays.json")).history("7").len(), 1);
}

#[test]
fn mistakes_past_the_last_cell_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let text = format!("{}{}", "가".repeat(700), "나".repeat(9));
    let service = service_with(
        &dir,
        ScoreResult {
            score: 40,
            mistakes: vec!["나".to_string()],
            corrected_text: text.clone(),
            feedback: String::new(),
        },
    );

    let done = service.finalize("7", &text).unwrap();
    assert!(done.highlights.is_empty());
    assert!(done.caption.contains("총 칸: 709"));
    assert!(image::load_from_memory(&done.image_png).is_ok());
}

#[test]
fn invalid_primary_result_falls_back_to_heuristic() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(
        &dir,
        ScoreResult { score: 99, ..ScoreResult::default() },
    );
    let done = service.finalize("7", "안녕하세요. 반갑습니다.").unwrap();
    assert_eq!(done.submission.score, 11);
    assert!(done.submission.feedback.starts_with("샘플 분석 (대체)"));
}

#[test]
fn empty_essay_is_not_processed() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(&dir, ScoreResult::default());
    assert!(matches!(service.finalize("7", " \n\t"), Err(EssayError::EmptyEssay)));
    assert!(!dir.path().join("essays.json").exists());
}
