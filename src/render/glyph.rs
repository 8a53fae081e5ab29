use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::fs;
use std::path::Path;

use crate::error::{EssayError, Result};

/// Native size of one bitmap glyph, before scaling.
pub const GLYPH_SIZE: u32 = 8;

/// Checked against every font before it is trusted with Korean text.
const HANGUL_SAMPLE: char = '가';

/// Fonts tried when no `[render] font_path` is configured or it fails to load.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
    "/usr/share/fonts/nanum/NanumGothic.ttf",
    "/System/Library/Fonts/AppleSDGothicNeo.ttc",
    "C:\\Windows\\Fonts\\malgun.ttf",
];

/// Draws text onto the sheet at a pixel size.
pub trait GlyphRasterizer {
    /// Draws `text` left to right with its top-left corner at `(x, y)`.
    fn draw_text(&self, img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, px: f32);

    /// Width and height `text` would occupy at `px`.
    fn measure(&self, text: &str, px: f32) -> (u32, u32);
}

/// Straight alpha blend of `src` over `dst`.
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let mix = |d: u8, s: u8| (f64::from(d) * inv + f64::from(s) * a).round().clamp(0.0, 255.0) as u8;
    let out_a = (f64::from(dst[3]) + f64::from(src[3]) * inv).round().clamp(0.0, 255.0) as u8;
    Rgba([mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2]), out_a])
}

pub fn blend_at(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let dst = *img.get_pixel(x as u32, y as u32);
    img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
}

/// TrueType/OpenType rasterizer. Characters the font has no outline for are
/// handed to the bitmap fallback one by one.
pub struct FontRasterizer {
    font: FontVec,
    fallback: BitmapRasterizer,
}

impl FontRasterizer {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(bytes).map_err(|e| EssayError::Font(e.to_string()))?;
        Ok(FontRasterizer { font, fallback: BitmapRasterizer })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(bytes).map_err(|e| EssayError::Font(format!("{}: {}", path.display(), e)))
    }

    pub fn covers(&self, ch: char) -> bool {
        self.font.glyph_id(ch).0 != 0
    }

    fn advance(&self, ch: char, px: f32) -> u32 {
        if self.covers(ch) {
            let scaled = self.font.as_scaled(PxScale::from(px));
            scaled.h_advance(scaled.glyph_id(ch)).ceil() as u32
        } else {
            self.fallback.measure(ch.encode_utf8(&mut [0; 4]), px).0
        }
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn draw_text(&self, img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, px: f32) {
        let mut cursor_x = x;
        let mut buf = [0; 4];
        for ch in text.chars() {
            let s = ch.encode_utf8(&mut buf);
            if ch.is_whitespace() || self.covers(ch) {
                draw_text_mut(img, color, cursor_x, y, PxScale::from(px), &self.font, s);
            } else {
                self.fallback.draw_text(img, cursor_x, y, s, color, px);
            }
            cursor_x += self.advance(ch, px) as i32;
        }
    }

    fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        let scaled = self.font.as_scaled(PxScale::from(px));
        let line = (scaled.ascent() - scaled.descent()).ceil() as u32;
        let width = text.chars().map(|ch| self.advance(ch, px)).sum();
        (width, line.max(self.fallback.measure("", px).1))
    }
}

/// Loads the configured font, then the first system font with Hangul
/// coverage, and settles for the bitmap rasterizer when neither works.
pub fn load_rasterizer(font_path: Option<&Path>) -> Box<dyn GlyphRasterizer + Send + Sync> {
    if let Some(path) = font_path {
        match FontRasterizer::from_file(path) {
            Ok(font) => {
                if !font.covers(HANGUL_SAMPLE) {
                    tracing::warn!("Font {} has no Hangul glyphs; Korean falls back to code boxes", path.display());
                }
                tracing::info!("Using font {}", path.display());
                return Box::new(font);
            }
            Err(e) => tracing::warn!("Could not load configured font: {}", e),
        }
    }
    for candidate in SYSTEM_FONT_CANDIDATES {
        let path = Path::new(candidate);
        if !path.is_file() {
            continue;
        }
        match FontRasterizer::from_file(path) {
            Ok(font) if font.covers(HANGUL_SAMPLE) => {
                tracing::info!("Using system font {}", path.display());
                return Box::new(font);
            }
            Ok(_) => tracing::debug!("Skipping {}: no Hangul glyphs", path.display()),
            Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
        }
    }
    tracing::warn!("No usable font found; drawing with the 8x8 bitmap font");
    Box::new(BitmapRasterizer)
}

/// 8x8 bitmap font covering ASCII and Latin-1. Anything else (Hangul included)
/// is drawn as a box holding the low four hex digits of its code point, so
/// different characters stay distinguishable on the sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapRasterizer;

impl BitmapRasterizer {
    fn bitmap_for(ch: char) -> Option<[u8; 8]> {
        BASIC_FONTS.get(ch).or_else(|| LATIN_FONTS.get(ch))
    }

    fn scale_for(px: f32) -> i32 {
        ((px / GLYPH_SIZE as f32).floor() as i32).max(1)
    }

    fn draw_bitmap(img: &mut RgbaImage, x: i32, y: i32, glyph: [u8; 8], color: Rgba<u8>, scale: i32) {
        for (row_idx, &row_bits) in glyph.iter().enumerate() {
            for col_idx in 0..GLYPH_SIZE as i32 {
                if (row_bits >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = x + col_idx * scale;
                let py = y + row_idx as i32 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        blend_at(img, px + sx, py + sy, color);
                    }
                }
            }
        }
    }

    fn draw_outline(img: &mut RgbaImage, x: i32, y: i32, size: i32, color: Rgba<u8>) {
        draw_hollow_rect_mut(img, Rect::at(x, y).of_size(size as u32, size as u32), color);
    }

    // Below scale 2 there is no room for digits, only the outline.
    fn draw_hex_box(img: &mut RgbaImage, x: i32, y: i32, ch: char, color: Rgba<u8>, scale: i32) {
        let size = GLYPH_SIZE as i32 * scale;
        if scale < 2 {
            Self::draw_outline(img, x, y, size, color);
            return;
        }
        Self::draw_outline(img, x - 1, y - 1, size + 2, color);
        let digit_scale = scale / 2;
        let step = GLYPH_SIZE as i32 * digit_scale;
        let hex = format!("{:04X}", u32::from(ch) & 0xFFFF);
        for (i, digit) in hex.chars().enumerate() {
            let Some(glyph) = BASIC_FONTS.get(digit) else { continue };
            let dx = (i as i32 % 2) * step;
            let dy = (i as i32 / 2) * step;
            Self::draw_bitmap(img, x + dx, y + dy, glyph, color, digit_scale);
        }
    }
}

impl GlyphRasterizer for BitmapRasterizer {
    fn draw_text(&self, img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, px: f32) {
        let scale = Self::scale_for(px);
        let advance = GLYPH_SIZE as i32 * scale;
        let mut cursor_x = x;
        for ch in text.chars() {
            if ch == ' ' {
                cursor_x += advance;
                continue;
            }
            match Self::bitmap_for(ch) {
                Some(glyph) => Self::draw_bitmap(img, cursor_x, y, glyph, color, scale),
                None => Self::draw_hex_box(img, cursor_x, y, ch, color, scale),
            }
            cursor_x += advance;
        }
    }

    fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        let unit = GLYPH_SIZE * Self::scale_for(px) as u32;
        (text.chars().count() as u32 * unit, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn canvas(size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]))
    }

    fn inked(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p[0] < 128).count()
    }

    #[test]
    fn ascii_glyph_leaves_ink() {
        let mut img = canvas(16);
        BitmapRasterizer.draw_text(&mut img, 0, 0, "A", BLACK, 8.0);
        assert!(inked(&img) > 0);
    }

    #[test]
    fn small_unknown_glyph_draws_box_outline() {
        let mut img = canvas(16);
        BitmapRasterizer.draw_text(&mut img, 0, 0, "가", BLACK, 8.0);
        assert_eq!(inked(&img), 28);
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(3, 3)[0], 255);
    }

    #[test]
    fn distinct_hangul_syllables_draw_distinct_boxes() {
        let draw = |text: &str| {
            let mut img = canvas(24);
            BitmapRasterizer.draw_text(&mut img, 2, 2, text, BLACK, 18.0);
            img
        };
        let ga = draw("가");
        let na = draw("나");
        assert!(inked(&ga) > 64);
        assert_ne!(ga, na);
        assert_eq!(ga, draw("가"));
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let mut img = canvas(4);
        BitmapRasterizer.draw_text(&mut img, -80, -80, "W가", BLACK, 24.0);
        assert_eq!(inked(&img), 0);
    }

    #[test]
    fn measure_scales_with_length() {
        assert_eq!(BitmapRasterizer.measure("abc", 18.0), (48, 16));
        assert_eq!(BitmapRasterizer.measure("", 15.0), (0, 8));
    }

    #[test]
    fn blending_half_alpha_black_over_white() {
        let out = blend_pixel(Rgba([255, 255, 255, 255]), Rgba([0, 0, 0, 128]));
        assert!(out[0] > 120 && out[0] < 135);
        assert_eq!(out[3], 255);
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let err = FontRasterizer::from_bytes(vec![0u8; 64]).err();
        assert!(matches!(err, Some(EssayError::Font(_))));
    }

    #[test]
    fn missing_font_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FontRasterizer::from_file(&dir.path().join("absent.ttf")).err();
        assert!(matches!(err, Some(EssayError::Io(_))));
    }

    #[test]
    fn unloadable_configured_font_still_yields_a_rasterizer() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.ttf");
        fs::write(&bogus, b"not a font").unwrap();
        let rasterizer = load_rasterizer(Some(&bogus));
        let mut img = canvas(32);
        rasterizer.draw_text(&mut img, 4, 4, "가", BLACK, 18.0);
        assert!(inked(&img) > 0);
    }

    #[test]
    fn outline_font_renders_and_delegates_uncovered_chars() {
        let path = Path::new("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf");
        if !path.is_file() {
            return;
        }
        let font = FontRasterizer::from_file(path).unwrap();
        assert!(font.covers('A'));

        let draw = |text: &str| {
            let mut img = canvas(40);
            font.draw_text(&mut img, 4, 4, text, BLACK, 18.0);
            img
        };
        let a = draw("A");
        assert!(inked(&a) > 0);
        assert_ne!(a, draw("B"));
        if !font.covers('가') {
            assert_ne!(draw("가"), draw("나"));
        }
        let (w, h) = font.measure("AA", 18.0);
        assert!(w > font.measure("A", 18.0).0 && h >= 16);
    }
}
