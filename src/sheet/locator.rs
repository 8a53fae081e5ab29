use serde::Serialize;
use std::collections::BTreeSet;

use super::layout::{characters, CellCoordinate, GridSpec};

/// Cells to paint in the mistake colour. Iterates in row-major order.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSet {
    cells: BTreeSet<CellCoordinate>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cell: CellCoordinate) -> bool {
        self.cells.insert(cell)
    }

    pub fn contains(&self, cell: &CellCoordinate) -> bool {
        self.cells.contains(cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellCoordinate> {
        self.cells.iter()
    }

    pub fn to_sorted_vec(&self) -> Vec<CellCoordinate> {
        self.cells.iter().copied().collect()
    }
}

impl FromIterator<CellCoordinate> for HighlightSet {
    fn from_iter<I: IntoIterator<Item = CellCoordinate>>(iter: I) -> Self {
        HighlightSet { cells: iter.into_iter().collect() }
    }
}

// Leftmost occurrence of `needle` in `haystack` at or after `start`, both in grid units.
fn find_from(haystack: &[&str], needle: &[&str], start: usize) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let last_start = haystack.len() - needle.len();
    (start..=last_start).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Maps flagged mistake substrings to the grid cells they cover in `text`.
///
/// Each mistake is searched as given and trimmed. After a hit the scan resumes at
/// `hit + max(1, needle_len)`, so overlapping repeats of the same needle are not
/// reported twice. Cells past the last row are dropped.
pub fn locate<S: AsRef<str>>(text: &str, mistakes: &[S], cols: usize, rows: usize) -> HighlightSet {
    let grid = GridSpec::new(rows, cols);
    let haystack = characters(text);
    let mut highlights = HighlightSet::new();

    for mistake in mistakes {
        let raw = mistake.as_ref();
        if raw.is_empty() {
            continue;
        }
        let trimmed = raw.trim();
        let mut variants = vec![raw];
        if trimmed != raw {
            variants.push(trimmed);
        }

        for variant in variants {
            let needle = characters(variant);
            if needle.is_empty() {
                continue;
            }
            let mut start = 0;
            while let Some(hit) = find_from(&haystack, &needle, start) {
                for index in hit..hit + needle.len() {
                    if let Some(cell) = grid.coordinate_of(index) {
                        highlights.insert(cell);
                    }
                }
                start = hit + needle.len().max(1);
            }
        }
    }
    highlights
}
