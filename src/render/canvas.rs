//! RGBA drawing surface for card rendering.
//!
//! All primitives take signed coordinates and clip to the canvas, so layers
//! positioned partly off-card draw what is visible and nothing else.

use image::{Rgba, RgbaImage, imageops};

use super::font::Mask;

// ============================================================================
// COLORS
// ============================================================================

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let nib = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Rgba([nib(0)?, nib(1)?, nib(2)?, 255]))
        }
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

// ============================================================================
// CANVAS
// ============================================================================

/// The output image being composed.
pub struct Canvas {
    img: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            img: RgbaImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.img
    }

    pub fn into_image(self) -> RgbaImage {
        self.img
    }

    /// Clip a rectangle to the canvas: `(x0, y0, x1, y1)` exclusive, or `None`.
    fn clip(&self, x: i64, y: i64, w: i64, h: i64) -> Option<(u32, u32, u32, u32)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.img.width() as i64);
        let y1 = (y + h).min(self.img.height() as i64);
        (x0 < x1 && y0 < y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    /// Blend `color` into one pixel with extra coverage `alpha` (0..=1).
    #[inline]
    fn blend(&mut self, x: u32, y: u32, color: Rgba<u8>, alpha: f32) {
        let a = alpha * color[3] as f32 / 255.0;
        if a <= 0.0 {
            return;
        }
        let dst = self.img.get_pixel_mut(x, y);
        for c in 0..3 {
            dst[c] = (color[c] as f32 * a + dst[c] as f32 * (1.0 - a)).round() as u8;
        }
        dst[3] = (255.0 * a + dst[3] as f32 * (1.0 - a)).round() as u8;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba<u8>) {
        let Some((x0, y0, x1, y1)) = self.clip(x as i64, y as i64, w as i64, h as i64) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color, 1.0);
            }
        }
    }

    /// Rectangle outline drawn inside the given bounds.
    pub fn stroke_rect(&mut self, x: i32, y: i32, w: u32, h: u32, thickness: u32, color: Rgba<u8>) {
        let t = thickness.min(w / 2).min(h / 2).max(1);
        self.fill_rect(x, y, w, t, color);
        self.fill_rect(x, y + h as i32 - t as i32, w, t, color);
        self.fill_rect(x, y + t as i32, t, h.saturating_sub(2 * t), color);
        self.fill_rect(x + w as i32 - t as i32, y + t as i32, t, h.saturating_sub(2 * t), color);
    }

    /// Horizontal line from `x0` to `x1` (exclusive), `thickness` px tall.
    pub fn hline(&mut self, x0: i32, x1: i32, y: i32, thickness: u32, color: Rgba<u8>) {
        if x1 > x0 {
            self.fill_rect(x0, y, (x1 - x0) as u32, thickness.max(1), color);
        }
    }

    /// Paint a coverage mask in `color` with its top-left corner at `(x, y)`.
    pub fn draw_mask(&mut self, mask: &Mask, x: i32, y: i32, color: Rgba<u8>) {
        let Some((x0, y0, x1, y1)) =
            self.clip(x as i64, y as i64, mask.width as i64, mask.height as i64)
        else {
            return;
        };
        for py in y0..y1 {
            let my = (py as i64 - y as i64) as usize;
            for px in x0..x1 {
                let mx = (px as i64 - x as i64) as usize;
                let coverage = mask.get(mx, my);
                if coverage > 0.0 {
                    self.blend(px, py, color, coverage.min(1.0));
                }
            }
        }
    }

    /// Alpha-composite `src` with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, src: &RgbaImage, x: i32, y: i32) {
        imageops::overlay(&mut self.img, src, x as i64, y as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color(" #00ff0080 "), Some(Rgba([0, 255, 0, 128])));
        assert_eq!(parse_color("#fff"), Some(WHITE));
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#gg0000"), None);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut canvas = Canvas::new(10, 10, WHITE);
        canvas.fill_rect(-5, -5, 8, 8, BLACK);
        assert_eq!(*canvas.image().get_pixel(0, 0), BLACK);
        assert_eq!(*canvas.image().get_pixel(2, 2), BLACK);
        assert_eq!(*canvas.image().get_pixel(3, 3), WHITE);
        canvas.fill_rect(20, 20, 5, 5, BLACK);
    }

    #[test]
    fn test_stroke_rect_leaves_inside() {
        let mut canvas = Canvas::new(10, 10, WHITE);
        canvas.stroke_rect(0, 0, 10, 10, 2, BLACK);
        assert_eq!(*canvas.image().get_pixel(1, 5), BLACK);
        assert_eq!(*canvas.image().get_pixel(8, 5), BLACK);
        assert_eq!(*canvas.image().get_pixel(5, 9), BLACK);
        assert_eq!(*canvas.image().get_pixel(5, 5), WHITE);
    }

    #[test]
    fn test_draw_mask_blends_coverage() {
        let mut canvas = Canvas::new(4, 4, WHITE);
        let mask = Mask {
            width: 2,
            height: 1,
            data: vec![1.0, 0.5],
        };
        canvas.draw_mask(&mask, 1, 1, BLACK);
        assert_eq!(*canvas.image().get_pixel(1, 1), BLACK);
        let half = canvas.image().get_pixel(2, 1);
        assert!(half[0] > 100 && half[0] < 150);
        assert_eq!(*canvas.image().get_pixel(3, 1), WHITE);
    }

    #[test]
    fn test_blit_transparent_keeps_background() {
        let mut canvas = Canvas::new(4, 4, WHITE);
        let mut src = RgbaImage::new(2, 2);
        src.put_pixel(0, 0, BLACK);
        canvas.blit(&src, 1, 1);
        assert_eq!(*canvas.image().get_pixel(1, 1), BLACK);
        assert_eq!(*canvas.image().get_pixel(2, 2), WHITE);
    }
}
