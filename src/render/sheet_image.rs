use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::io::Cursor;
use std::path::Path;

use super::glyph::{load_rasterizer, BitmapRasterizer, GlyphRasterizer};
use crate::error::Result;
use crate::sheet::{CellCoordinate, GridSpec, HighlightSet};

pub const CELL_SIZE: u32 = 28;
pub const OUTER_PADDING: u32 = 25;
const HEADER_BAND: u32 = 20;
const RIGHT_MARGIN: u32 = 60;
const BOTTOM_MARGIN: u32 = 80;
const DOT_SPACING: u32 = 6;
const MARK_BOX_W: u32 = 200;
const MARK_BOX_H: u32 = 25;

// Pixel sizes: essay glyphs, punctuation, captions.
const GLYPH_PX: f32 = 18.0;
const PUNCT_PX: f32 = 15.0;
const LABEL_PX: f32 = 15.0;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
// Black at alpha 120 over white.
const FAINT_INK: Rgba<u8> = Rgba([135, 135, 135, 255]);
pub const MISTAKE_INK: Rgba<u8> = Rgba([220, 20, 20, 255]);

const HEADER_TITLE: &str = "54 - Essay Sheet";
const HEADER_NAME: &str = "Name: ____________________";
const FOOTER_EN: &str =
    "Please don't turn answer sheet horizontally, otherwise you will get 100 points.";
const FOOTER_KR: &str = "답안지를 가로로 돌리지 마세요, 그렇지 않으면 100점을 받습니다.";
const MARK_LABEL: &str = "Teacher's Mark / 성적";

/// Turns laid-out essay text into an image.
pub trait Renderer {
    fn render(&self, text: &str, highlights: &HighlightSet) -> Result<Vec<u8>>;
}

/// Draws the TOPIK answer sheet: ruled grid, row counters, header, footer and
/// one glyph per cell, mistakes in red.
pub struct SheetRenderer {
    grid: GridSpec,
    rasterizer: Box<dyn GlyphRasterizer + Send + Sync>,
}

fn is_small_punctuation(glyph: &str) -> bool {
    matches!(glyph, "." | "," | "!" | "?" | ";" | ":" | "(" | ")" | "[" | "]" | "{" | "}")
}

impl SheetRenderer {
    /// Bitmap-only renderer; needs no font on disk.
    pub fn new(grid: GridSpec) -> Self {
        Self::with_rasterizer(grid, Box::new(BitmapRasterizer))
    }

    /// Uses the font at `font_path`, or a system Hangul font, before the bitmap.
    pub fn with_font(grid: GridSpec, font_path: Option<&Path>) -> Self {
        Self::with_rasterizer(grid, load_rasterizer(font_path))
    }

    pub fn with_rasterizer(grid: GridSpec, rasterizer: Box<dyn GlyphRasterizer + Send + Sync>) -> Self {
        SheetRenderer { grid, rasterizer }
    }

    pub fn image_size(&self) -> (u32, u32) {
        let grid_w = self.grid.cols as u32 * CELL_SIZE;
        let grid_h = self.grid.rows as u32 * CELL_SIZE;
        (
            grid_w + OUTER_PADDING * 2 + RIGHT_MARGIN,
            grid_h + OUTER_PADDING * 2 + BOTTOM_MARGIN,
        )
    }

    /// Top-left pixel of a cell.
    pub fn cell_origin(&self, cell: CellCoordinate) -> (u32, u32) {
        (
            OUTER_PADDING + cell.col as u32 * CELL_SIZE,
            OUTER_PADDING + HEADER_BAND + cell.row as u32 * CELL_SIZE,
        )
    }

    pub fn draw(&self, text: &str, highlights: &HighlightSet) -> RgbaImage {
        let (img_w, img_h) = self.image_size();
        let mut img = RgbaImage::from_pixel(img_w, img_h, WHITE);

        self.draw_header(&mut img);
        self.draw_rules(&mut img);
        self.draw_row_counters(&mut img);

        for placed in self.grid.place(text) {
            let color = if highlights.contains(&placed.cell) { MISTAKE_INK } else { INK };
            self.draw_glyph(&mut img, placed.cell, placed.glyph, color);
        }

        self.draw_footer(&mut img);
        img
    }

    fn draw_header(&self, img: &mut RgbaImage) {
        let (img_w, _) = self.image_size();
        let y = HEADER_BAND as i32;
        self.rasterizer.draw_text(img, OUTER_PADDING as i32, y, HEADER_TITLE, INK, LABEL_PX);
        let (name_w, _) = self.rasterizer.measure(HEADER_NAME, LABEL_PX);
        let name_x = img_w.saturating_sub(OUTER_PADDING + name_w) as i32;
        self.rasterizer.draw_text(img, name_x, y, HEADER_NAME, INK, LABEL_PX);
    }

    fn draw_rules(&self, img: &mut RgbaImage) {
        let left = OUTER_PADDING;
        let top = OUTER_PADDING + HEADER_BAND;
        let grid_w = self.grid.cols as u32 * CELL_SIZE;
        let grid_h = self.grid.rows as u32 * CELL_SIZE;

        // Solid every 4th row and 5th column, dotted in between.
        for r in 0..=self.grid.rows as u32 {
            let y = (top + r * CELL_SIZE) as f32;
            let (start, end) = ((left as f32, y), ((left + grid_w) as f32, y));
            if r % 4 == 0 {
                draw_line_segment_mut(img, start, end, INK);
            } else {
                draw_dotted_segment(img, start, end, FAINT_INK);
            }
        }
        for c in 0..=self.grid.cols as u32 {
            let x = (left + c * CELL_SIZE) as f32;
            let (start, end) = ((x, top as f32), (x, (top + grid_h) as f32));
            if c % 5 == 0 {
                draw_line_segment_mut(img, start, end, INK);
            } else {
                draw_dotted_segment(img, start, end, FAINT_INK);
            }
        }
    }

    fn draw_row_counters(&self, img: &mut RgbaImage) {
        let top = OUTER_PADDING + HEADER_BAND;
        let x = (OUTER_PADDING + self.grid.cols as u32 * CELL_SIZE + 5) as i32;
        for r in (2..=self.grid.rows as u32).step_by(2) {
            let y = (top + r * CELL_SIZE - CELL_SIZE / 3) as i32;
            let number = 50 * (r / 2);
            self.rasterizer.draw_text(img, x, y, &number.to_string(), INK, LABEL_PX);
        }
    }

    fn draw_glyph(&self, img: &mut RgbaImage, cell: CellCoordinate, glyph: &str, color: Rgba<u8>) {
        if glyph.trim().is_empty() {
            return;
        }
        let px = if is_small_punctuation(glyph) { PUNCT_PX } else { GLYPH_PX };
        let (x0, y0) = self.cell_origin(cell);
        // One grid unit may hold several chars (combining marks); center the first.
        let first: String = glyph.chars().take(1).collect();
        let (w, h) = self.rasterizer.measure(&first, px);
        let x = x0 + CELL_SIZE.saturating_sub(w) / 2;
        let y = y0 + CELL_SIZE.saturating_sub(h) / 2;
        self.rasterizer.draw_text(img, x as i32, y as i32, &first, color, px);
    }

    fn draw_footer(&self, img: &mut RgbaImage) {
        let (img_w, img_h) = self.image_size();
        let x = OUTER_PADDING as i32;
        self.rasterizer.draw_text(img, x, img_h as i32 - 80, FOOTER_EN, INK, LABEL_PX);
        self.rasterizer.draw_text(img, x, img_h as i32 - 50, FOOTER_KR, INK, LABEL_PX);

        let mark_x = img_w.saturating_sub(OUTER_PADDING + MARK_BOX_W);
        let mark_y = img_h.saturating_sub(53);
        draw_hollow_rect_mut(img, Rect::at(mark_x as i32, mark_y as i32).of_size(MARK_BOX_W, MARK_BOX_H), INK);
        self.rasterizer.draw_text(img, mark_x as i32 + 10, mark_y as i32 + 8, MARK_LABEL, INK, LABEL_PX);
    }
}

impl Renderer for SheetRenderer {
    fn render(&self, text: &str, highlights: &HighlightSet) -> Result<Vec<u8>> {
        let img = self.draw(text, highlights);
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

// Short dashes every DOT_SPACING pixels along an axis-aligned segment.
fn draw_dotted_segment(img: &mut RgbaImage, start: (f32, f32), end: (f32, f32), color: Rgba<u8>) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = dx.abs().max(dy.abs());
    if length <= 0.0 {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let dash = (DOT_SPACING / 2 - 1) as f32;
    let mut t = 0.0;
    while t <= length {
        let run = dash.min(length - t);
        let from = (start.0 + ux * t, start.1 + uy * t);
        let to = (from.0 + ux * run, from.1 + uy * run);
        draw_line_segment_mut(img, from, to, color);
        t += DOT_SPACING as f32;
    }
}
