//! Image fit engine: maps a raster into a fixed region.
//!
//! | Mode      | Scale                        | Result                       |
//! |-----------|------------------------------|------------------------------|
//! | `fill`    | `max(w/iw, h/ih)`, uniform   | covers the region, crops     |
//! | `fit`     | `min(w/iw, h/ih)`, uniform   | never crops, may leave margin|
//! | `stretch` | independent x/y              | exact region, may distort    |
//! | `center`  | none                         | native size, centered        |

use image::{DynamicImage, RgbaImage, imageops, imageops::FilterType};

use crate::cardstyle::FitMode;

/// Where the scaled image lands relative to the region's top-left corner.
///
/// `x`/`y` may be negative (image larger than the region) for fill and center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Compute the drawn rectangle for an `img_w × img_h` image in a `w × h` region.
pub fn placement(img_w: u32, img_h: u32, w: u32, h: u32, mode: FitMode) -> Placement {
    if img_w == 0 || img_h == 0 {
        return Placement {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    }

    let sx = w as f64 / img_w as f64;
    let sy = h as f64 / img_h as f64;
    let (width, height) = match mode {
        FitMode::Fill => {
            let scale = sx.max(sy);
            (
                ((img_w as f64 * scale).round() as u32).max(w),
                ((img_h as f64 * scale).round() as u32).max(h),
            )
        }
        FitMode::Fit => {
            let scale = sx.min(sy);
            (
                ((img_w as f64 * scale).round() as u32).clamp(1, w.max(1)),
                ((img_h as f64 * scale).round() as u32).clamp(1, h.max(1)),
            )
        }
        FitMode::Stretch => (w, h),
        FitMode::Center => (img_w, img_h),
    };

    Placement {
        x: (w as i64 - width as i64) / 2,
        y: (h as i64 - height as i64) / 2,
        width,
        height,
    }
}

/// Produce a `w × h` image with `img` placed per `mode`.
///
/// Pixels not covered by the image are transparent.
pub fn fit_image(img: &DynamicImage, w: u32, h: u32, mode: FitMode) -> RgbaImage {
    let mut out = RgbaImage::new(w, h);
    let place = placement(img.width(), img.height(), w, h, mode);
    if place.width == 0 || place.height == 0 || w == 0 || h == 0 {
        return out;
    }

    let scaled = if place.width == img.width() && place.height == img.height() {
        img.to_rgba8()
    } else {
        img.resize_exact(place.width, place.height, FilterType::Lanczos3)
            .to_rgba8()
    };
    imageops::replace(&mut out, &scaled, place.x, place.y);
    out
}
