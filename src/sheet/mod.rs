pub mod layout;
pub mod locator;
pub mod normalizer;

pub use layout::{characters, count_squares, CellCoordinate, GridSpec, PlacedChar};
pub use locator::{locate, HighlightSet};
pub use normalizer::normalize;
