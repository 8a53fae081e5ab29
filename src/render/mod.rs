pub mod glyph;
pub mod sheet_image;

pub use glyph::{load_rasterizer, BitmapRasterizer, FontRasterizer, GlyphRasterizer};
pub use sheet_image::{Renderer, SheetRenderer};
