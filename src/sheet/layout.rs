use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Rows and columns of a TOPIK answer sheet.
pub const DEFAULT_ROWS: usize = 28;
pub const DEFAULT_COLS: usize = 25;

/// The fixed writing surface. `rows * cols` is the character capacity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        GridSpec { rows: DEFAULT_ROWS, cols: DEFAULT_COLS }
    }
}

/// One cell of the grid. Field order gives row-major `Ord`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellCoordinate {
    pub row: usize,
    pub col: usize,
}

impl CellCoordinate {
    pub fn new(row: usize, col: usize) -> Self {
        CellCoordinate { row, col }
    }
}

/// A character placed on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedChar<'a> {
    pub cell: CellCoordinate,
    pub glyph: &'a str,
}

impl GridSpec {
    pub fn new(rows: usize, cols: usize) -> Self {
        GridSpec { rows, cols }
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    /// Cell for the character at `index`, or `None` once the index runs past the last row.
    pub fn coordinate_of(&self, index: usize) -> Option<CellCoordinate> {
        if self.cols == 0 {
            return None;
        }
        let row = index / self.cols;
        if row >= self.rows {
            return None;
        }
        Some(CellCoordinate { row, col: index % self.cols })
    }

    /// Lays `text` out one character per cell, left to right, top to bottom.
    /// Characters that don't fit are dropped.
    pub fn place<'a>(&self, text: &'a str) -> Vec<PlacedChar<'a>> {
        let glyphs = characters(text);
        let mut placed = Vec::with_capacity(glyphs.len().min(self.capacity()));
        for (index, glyph) in glyphs.into_iter().enumerate() {
            match self.coordinate_of(index) {
                Some(cell) => placed.push(PlacedChar { cell, glyph }),
                None => {
                    tracing::debug!(
                        "Text exceeds grid capacity of {} cells, dropping from index {}",
                        self.capacity(),
                        index
                    );
                    break;
                }
            }
        }
        placed
    }
}

/// Splits text into grid units: one extended grapheme cluster each, so a Hangul
/// syllable or an emoji always takes exactly one cell.
pub fn characters(text: &str) -> Vec<&str> {
    text.graphemes(true).collect()
}

/// Number of cells `text` needs (before any truncation).
pub fn count_squares(text: &str) -> usize {
    text.graphemes(true).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_sheet_is_28_by_25() {
        let spec = GridSpec::default();
        assert_eq!(spec.capacity(), 700);
    }

    #[test]
    fn coordinates_wrap_by_column_count() {
        let spec = GridSpec::default();
        assert_eq!(spec.coordinate_of(0), Some(CellCoordinate::new(0, 0)));
        assert_eq!(spec.coordinate_of(24), Some(CellCoordinate::new(0, 24)));
        assert_eq!(spec.coordinate_of(25), Some(CellCoordinate::new(1, 0)));
        assert_eq!(spec.coordinate_of(699), Some(CellCoordinate::new(27, 24)));
        assert_eq!(spec.coordinate_of(700), None);
    }

    #[test]
    fn multibyte_characters_take_one_cell_each() {
        let spec = GridSpec::default();
        let placed = spec.place("가나다");
        let cells: Vec<_> = placed.iter().map(|p| (p.cell, p.glyph)).collect();
        assert_eq!(
            cells,
            vec![
                (CellCoordinate::new(0, 0), "가"),
                (CellCoordinate::new(0, 1), "나"),
                (CellCoordinate::new(0, 2), "다"),
            ]
        );
    }

    #[test]
    fn decomposed_jamo_is_one_cell() {
        // ᄒ + ᅡ + ᆫ renders as 한
        assert_eq!(count_squares("\u{1112}\u{1161}\u{11AB}"), 1);
        assert_eq!(count_squares("한국"), 2);
    }

    #[test]
    fn overflow_is_truncated_silently() {
        let spec = GridSpec::default();
        let text: String = "가".repeat(spec.capacity() + 10);
        let placed = spec.place(&text);
        assert_eq!(placed.len(), 700);
        assert_eq!(placed.last().map(|p| p.cell), Some(CellCoordinate::new(27, 24)));
        assert_eq!(count_squares(&text), 710);
    }

    #[test]
    fn zero_column_grid_places_nothing() {
        let spec = GridSpec::new(3, 0);
        assert_eq!(spec.coordinate_of(0), None);
        assert!(spec.place("abc").is_empty());
    }

    proptest! {
        #[test]
        fn coordinate_formula_holds(rows in 1usize..40, cols in 1usize..40, index in 0usize..2000) {
            let spec = GridSpec::new(rows, cols);
            match spec.coordinate_of(index) {
                Some(cell) => {
                    prop_assert!(index < rows * cols);
                    prop_assert_eq!(cell, CellCoordinate::new(index / cols, index % cols));
                    prop_assert!(cell.row < rows && cell.col < cols);
                }
                None => prop_assert!(index >= rows * cols),
            }
        }
    }
}
