//! Font faces for text layers.
//!
//! Two kinds of face are supported:
//!
//! - **Bitmap**: the built-in Spleen font, scaled nearest-neighbor to the
//!   requested pixel size. Bold and italic are synthesized.
//! - **TrueType**: any `.ttf`/`.otf` file, rendered anti-aliased with
//!   `ab_glyph`. Bold and italic are synthesized the same way.
//!
//! Both render to a [`Mask`] of coverage values that the canvas blends in
//! the text color.

use ab_glyph::{Font, FontArc, ScaleFont};
use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

use crate::error::{CardgenError, Result};

/// Horizontal shear applied for synthesized italics, in px per px of height.
const ITALIC_SHEAR: f32 = 0.2;

/// Largest layer font size; bigger resolved sizes are clamped to this.
pub const MAX_FONT_PX: f32 = 512.0;

/// Widest mask a single run rasterizes to. Text past this edge is dropped.
pub const MAX_MASK_PX: f32 = 8192.0;

/// Size and style a run is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Pixel height.
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl TextStyle {
    pub fn regular(size: f32) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
        }
    }

    /// Pixels added on the right by synthesized bold.
    fn bold_offset(&self) -> usize {
        if self.bold {
            (self.size / 16.0).round().max(1.0) as usize
        } else {
            0
        }
    }
}

/// Rasterized text coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    /// 0.0 = empty, 1.0 = fully covered.
    pub data: Vec<f32>,
}

impl Mask {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&c| c <= 0.0)
    }

    /// Overdraw the mask shifted right by `px` pixels.
    fn embolden(self, px: usize) -> Mask {
        if px == 0 {
            return self;
        }
        let mut out = Mask::new(self.width + px, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.get(x, y);
                if c <= 0.0 {
                    continue;
                }
                for dx in 0..=px {
                    let idx = y * out.width + x + dx;
                    out.data[idx] = out.data[idx].max(c);
                }
            }
        }
        out
    }

    /// Slant the mask to the right, more at the top than at the bottom.
    fn shear(self, factor: f32) -> Mask {
        let extra = (self.height as f32 * factor).ceil() as usize;
        let mut out = Mask::new(self.width + extra, self.height);
        for y in 0..self.height {
            let shift = ((self.height - y) as f32 * factor).round() as usize;
            for x in 0..self.width {
                out.data[y * out.width + x + shift] = self.get(x, y);
            }
        }
        out
    }
}

/// A font face usable by the layout engine.
#[derive(Clone)]
pub enum FontFace {
    /// Built-in Spleen bitmap font.
    Bitmap,
    Truetype(FontArc),
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontFace::Bitmap => f.write_str("FontFace::Bitmap"),
            FontFace::Truetype(_) => f.write_str("FontFace::Truetype"),
        }
    }
}

impl FontFace {
    /// Load a TrueType/OpenType face from file contents.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        FontArc::try_from_vec(bytes)
            .map(FontFace::Truetype)
            .map_err(|e| CardgenError::Asset(format!("invalid font data: {}", e)))
    }

    /// Advance width of `text`, including synthesized bold.
    pub fn text_width(&self, text: &str, style: TextStyle) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let base = match self {
            FontFace::Bitmap => {
                let cell = BitmapCell::for_size(style.size);
                text.chars().count() as f32 * cell.advance(style.size)
            }
            FontFace::Truetype(font) => {
                let scaled = font.as_scaled(style.size);
                let mut width = 0.0;
                let mut prev = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width
            }
        };
        base + style.bold_offset() as f32
    }

    /// Render `text` to a coverage mask whose top edge is the line top.
    pub fn rasterize(&self, text: &str, style: TextStyle) -> Mask {
        let text = self.clip_to_mask(text, style.size);
        let mask = match self {
            FontFace::Bitmap => rasterize_bitmap(text, style.size),
            FontFace::Truetype(font) => rasterize_truetype(font, text, style.size),
        };
        let mask = mask.embolden(style.bold_offset());
        if style.italic {
            mask.shear(ITALIC_SHEAR)
        } else {
            mask
        }
    }

    /// Longest prefix of `text` whose advance fits in [`MAX_MASK_PX`].
    fn clip_to_mask<'t>(&self, text: &'t str, size: f32) -> &'t str {
        let mut width = 0.0;
        for (idx, ch) in text.char_indices() {
            width += match self {
                FontFace::Bitmap => BitmapCell::for_size(size).advance(size),
                FontFace::Truetype(font) => font.as_scaled(size).h_advance(font.glyph_id(ch)),
            };
            if width > MAX_MASK_PX {
                tracing::debug!(chars = text[..idx].chars().count(), "clipping oversized text run");
                return &text[..idx];
            }
        }
        text
    }
}

/// A Spleen font size and the cell it renders in.
struct BitmapCell {
    data: &'static [u8],
    width: usize,
    height: usize,
}

impl BitmapCell {
    /// Smallest Spleen size that is not upscaled more than necessary.
    fn for_size(size: f32) -> Self {
        if size <= 14.0 {
            Self {
                data: FONT_6X12,
                width: 6,
                height: 12,
            }
        } else if size <= 20.0 {
            Self {
                data: FONT_8X16,
                width: 8,
                height: 16,
            }
        } else {
            Self {
                data: FONT_12X24,
                width: 12,
                height: 24,
            }
        }
    }

    fn scale(&self, size: f32) -> f32 {
        size / self.height as f32
    }

    fn advance(&self, size: f32) -> f32 {
        self.width as f32 * self.scale(size)
    }
}

fn rasterize_bitmap(text: &str, size: f32) -> Mask {
    let cell = BitmapCell::for_size(size);
    let chars: Vec<char> = text.chars().collect();

    // Render at native cell resolution first.
    let src_w = chars.len() * cell.width;
    let mut src = vec![false; src_w * cell.height];
    let mut font = match PSF2Font::new(cell.data) {
        Ok(font) => Some(font),
        Err(_) => {
            tracing::error!("built-in bitmap font failed to load");
            None
        }
    };
    for (i, ch) in chars.iter().enumerate() {
        let origin = i * cell.width;
        let mut utf8 = [0u8; 4];
        let glyph = font
            .as_mut()
            .and_then(|f| f.glyph_for_utf8(ch.encode_utf8(&mut utf8).as_bytes()));
        match glyph {
            Some(glyph) => {
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if on && row_y < cell.height && col_x < cell.width {
                            src[row_y * src_w + origin + col_x] = true;
                        }
                    }
                }
            }
            None if !ch.is_whitespace() => draw_box(&mut src, src_w, origin, cell.width, cell.height),
            None => {}
        }
    }

    // Nearest-neighbor scale to the requested size.
    let scale = cell.scale(size);
    let dst_w = ((src_w as f32) * scale).round() as usize;
    let dst_h = size.round().max(1.0) as usize;
    let mut mask = Mask::new(dst_w, dst_h);
    if src_w == 0 {
        return mask;
    }
    for dy in 0..dst_h {
        let sy = (dy * cell.height / dst_h).min(cell.height - 1);
        for dx in 0..dst_w {
            let sx = (dx * src_w / dst_w).min(src_w - 1);
            if src[sy * src_w + sx] {
                mask.data[dy * dst_w + dx] = 1.0;
            }
        }
    }
    mask
}

/// Outline box for characters the font has no glyph for.
fn draw_box(buf: &mut [bool], stride: usize, origin: usize, w: usize, h: usize) {
    for x in 1..w - 1 {
        buf[stride + origin + x] = true;
        buf[(h - 2) * stride + origin + x] = true;
    }
    for y in 1..h - 1 {
        buf[y * stride + origin + 1] = true;
        buf[y * stride + origin + w - 2] = true;
    }
}

fn rasterize_truetype(font: &FontArc, text: &str, size: f32) -> Mask {
    let scaled = font.as_scaled(size);

    let mut glyphs = Vec::new();
    let mut caret_x = 0.0f32;
    let mut prev = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            caret_x += scaled.kern(p, id);
        }
        glyphs.push((id, caret_x));
        caret_x += scaled.h_advance(id);
        prev = Some(id);
    }

    let ascent = scaled.ascent();
    let descent = scaled.descent();
    let width = (caret_x.ceil() as usize).max(1);
    let height = ((ascent - descent).ceil() as usize).max(1);
    let mut mask = Mask::new(width, height);

    for (id, x) in glyphs {
        let glyph = id.with_scale_and_position(size, ab_glyph::point(x, ascent));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|px, py, coverage| {
            let x = px as i32 + bounds.min.x as i32;
            let y = py as i32 + bounds.min.y as i32;
            if x >= 0 && (x as usize) < width && y >= 0 && (y as usize) < height {
                let idx = y as usize * width + x as usize;
                mask.data[idx] = (mask.data[idx] + coverage).min(1.0);
            }
        });
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_width_scales_with_size() {
        let face = FontFace::Bitmap;
        let w24 = face.text_width("abcd", TextStyle::regular(24.0));
        let w48 = face.text_width("abcd", TextStyle::regular(48.0));
        assert_eq!(w24, 48.0);
        assert_eq!(w48, 96.0);
        assert_eq!(face.text_width("", TextStyle::regular(24.0)), 0.0);
    }

    #[test]
    fn test_bitmap_rasterize_dimensions() {
        let mask = FontFace::Bitmap.rasterize("Hi", TextStyle::regular(24.0));
        assert_eq!(mask.width, 24);
        assert_eq!(mask.height, 24);
        assert_eq!(mask.data.len(), mask.width * mask.height);
        assert!(!mask.is_empty());
    }

    #[test]
    fn test_space_renders_nothing() {
        let mask = FontFace::Bitmap.rasterize("  ", TextStyle::regular(16.0));
        assert!(mask.is_empty());
    }

    #[test]
    fn test_bold_is_wider_and_denser() {
        let face = FontFace::Bitmap;
        let regular = face.rasterize("Bold", TextStyle::regular(24.0));
        let style = TextStyle {
            bold: true,
            ..TextStyle::regular(24.0)
        };
        let bold = face.rasterize("Bold", style);
        assert!(bold.width > regular.width);
        let ink = |m: &Mask| m.data.iter().filter(|&&c| c > 0.0).count();
        assert!(ink(&bold) > ink(&regular));
        assert_eq!(face.text_width("Bold", style) as usize, bold.width);
    }

    #[test]
    fn test_italic_shears() {
        let style = TextStyle {
            italic: true,
            ..TextStyle::regular(20.0)
        };
        let mask = FontFace::Bitmap.rasterize("I", style);
        assert_eq!(mask.width, 10 + 4);
        assert_eq!(mask.height, 20);
    }

    #[test]
    fn test_long_run_is_clipped() {
        let text = "W".repeat(5000);
        let mask = FontFace::Bitmap.rasterize(&text, TextStyle::regular(MAX_FONT_PX));
        assert!(mask.width as f32 <= MAX_MASK_PX);
        assert_eq!(mask.height, MAX_FONT_PX as usize);
        assert!(!mask.is_empty());
    }

    #[test]
    fn test_invalid_font_bytes() {
        assert!(matches!(
            FontFace::from_bytes(vec![0, 1, 2, 3]),
            Err(CardgenError::Asset(_))
        ));
    }
}
