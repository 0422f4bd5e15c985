//! # Rendering Module
//!
//! Turns a [`Card`] and a resolved [`Template`] into an RGBA image.
//!
//! ## Modules
//!
//! - [`vars`]: the flattened `{{path}}` namespace for one render
//! - [`expr`]: placeholder substitution and layer conditions
//! - [`markdown`]: the markdown subset used in text layers
//! - [`layout`]: word wrap, alignment and vertical centering
//! - [`fit`]: fill / fit / stretch / center image placement
//! - [`font`]: built-in bitmap face and TrueType faces
//! - [`canvas`]: drawing primitives
//! - [`assets`], [`context`]: asset lookup and shared caches
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use cardgen::card::parse_file;
//! use cardgen::cardstyle::{Resolver, SearchPaths};
//! use cardgen::render::{CardRenderer, RenderContext};
//!
//! # fn main() -> cardgen::Result<()> {
//! let card = parse_file(Path::new("cards/bolt.md"))?;
//! let resolver = Resolver::new(SearchPaths::standard(None));
//! let template = resolver.resolve(&card.tcg, &card.cardstyle)?;
//!
//! let ctx = RenderContext::new();
//! let rendered = CardRenderer::new(&ctx).render(&card, &template)?;
//! assert_eq!(rendered.image.width(), template.dimensions.width);
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod canvas;
pub mod context;
pub mod expr;
pub mod fit;
pub mod font;
pub mod layout;
pub mod markdown;
pub mod vars;

pub use context::RenderContext;

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::card::Card;
use crate::cardstyle::{FitMode, FontSize, Layer, LayerKind, Template};
use crate::error::{CardgenError, Result};
use canvas::{BLACK, Canvas, WHITE, parse_color};
use font::{FontFace, MAX_FONT_PX, TextStyle};
use vars::Namespace;

// Placeholder drawn for image layers whose asset could not be loaded.
const PLACEHOLDER_FILL: Rgba<u8> = Rgba([200, 200, 200, 255]);
const PLACEHOLDER_BORDER: Rgba<u8> = Rgba([100, 100, 100, 255]);
const PLACEHOLDER_TEXT: Rgba<u8> = Rgba([50, 50, 50, 255]);
const PLACEHOLDER_BORDER_PX: u32 = 2;
const PLACEHOLDER_TEXT_PX: f32 = 16.0;

/// What happened while compositing a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Text layers that drew at least one item.
    pub text_draws: usize,
    /// Image layers that drew a loaded image.
    pub image_draws: usize,
    /// Image layers that fell back to the missing-asset placeholder.
    pub placeholders: usize,
    /// Layers skipped by their condition or for lack of content.
    pub skipped: usize,
}

/// A composited card.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub image: RgbaImage,
    pub report: RenderReport,
}

/// Paints template layers for a card, in order, onto a fresh canvas.
pub struct CardRenderer<'a> {
    ctx: &'a RenderContext,
}

impl<'a> CardRenderer<'a> {
    pub fn new(ctx: &'a RenderContext) -> Self {
        Self { ctx }
    }

    /// Render `card` with `template`.
    ///
    /// Missing images become placeholders; any other layer failure aborts
    /// the card with an error naming the layer.
    pub fn render(&self, card: &Card, template: &Template) -> Result<RenderedCard> {
        let background = template
            .background
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(WHITE);
        let mut canvas = Canvas::new(
            template.dimensions.width,
            template.dimensions.height,
            background,
        );

        let ns = Namespace::build(card, template);
        let mut report = RenderReport::default();

        for layer in &template.layers {
            if !expr::evaluate_condition(&layer.condition, &ns) {
                tracing::trace!(layer = %layer.name, condition = %layer.condition, "condition false");
                report.skipped += 1;
                continue;
            }
            match &layer.kind {
                LayerKind::Text => {
                    if self.draw_text(&mut canvas, layer, template, &ns) {
                        report.text_draws += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
                LayerKind::Image => match self.draw_image(&mut canvas, layer, card, template, &ns) {
                    ImageOutcome::Drawn => report.image_draws += 1,
                    ImageOutcome::Placeholder => report.placeholders += 1,
                },
                LayerKind::Other(_) => {
                    return Err(CardgenError::UnknownLayerType(layer.kind.to_string())
                        .in_layer(&layer.name));
                }
            }
        }

        tracing::debug!(
            card = %card.title,
            text = report.text_draws,
            images = report.image_draws,
            placeholders = report.placeholders,
            skipped = report.skipped,
            "card composited"
        );
        Ok(RenderedCard {
            image: canvas.into_image(),
            report,
        })
    }

    /// Returns false when the layer had nothing to draw.
    fn draw_text(&self, canvas: &mut Canvas, layer: &Layer, template: &Template, ns: &Namespace) -> bool {
        let mut content = layer.content.clone();
        if layer.icon_replace {
            content = expr::replace_icons(&content, &template.icons);
        }
        content = expr::substitute(&content, ns);
        if layer.icon_replace {
            content = expr::replace_icons(&content, &template.icons);
        }
        if layer.strip_headers {
            content = markdown::strip_headers(&content);
        }
        if content.trim().is_empty() {
            return false;
        }

        let font = layer.font.clone().unwrap_or_default();
        let style = TextStyle {
            size: font_size(&font.size, ns),
            bold: expr::substitute(&font.weight, ns).trim().eq_ignore_ascii_case("bold"),
            italic: expr::substitute(&font.style, ns).trim().eq_ignore_ascii_case("italic"),
        };
        let color_spec = expr::substitute(&font.color, ns);
        let color = parse_color(&color_spec).unwrap_or_else(|| {
            if !color_spec.trim().is_empty() {
                tracing::debug!(layer = %layer.name, color = %color_spec, "unparseable color, using black");
            }
            BLACK
        });
        let face = self
            .ctx
            .font(&expr::substitute(&font.family, ns), &template.template_dir);

        let lines = markdown::parse(&content);
        let laid_out = layout::layout(&lines, &layer.region, layer.align, style, &face);
        layout::draw(canvas, &laid_out, &face, color) > 0
    }

    fn draw_image(
        &self,
        canvas: &mut Canvas,
        layer: &Layer,
        card: &Card,
        template: &Template,
        ns: &Namespace,
    ) -> ImageOutcome {
        let mut dirs: Vec<&Path> = Vec::with_capacity(2);
        if let Some(dir) = card.base_dir() {
            dirs.push(dir);
        }
        dirs.push(&template.template_dir);

        let source = expr::substitute(&layer.source, ns);
        let fallback = expr::substitute(&layer.fallback, ns);

        let loaded = self.ctx.load_image(&source, &dirs).or_else(|err| {
            if fallback.trim().is_empty() || fallback == source {
                return Err(err);
            }
            tracing::debug!(layer = %layer.name, error = %err, "trying fallback image");
            self.ctx.load_image(&fallback, &dirs)
        });

        let region = layer.region;
        match loaded {
            Ok(img) => {
                let mode = fit_mode(layer, ns);
                let fitted = fit::fit_image(&img, region.width, region.height, mode);
                canvas.blit(&fitted, region.x, region.y);
                ImageOutcome::Drawn
            }
            Err(err) => {
                let missing = if source.trim().is_empty() { &fallback } else { &source };
                let name = match assets::display_name(missing) {
                    n if n.is_empty() => layer.name.clone(),
                    n => n,
                };
                tracing::warn!(layer = %layer.name, error = %err, "image unavailable, drawing placeholder");
                draw_placeholder(canvas, layer, &format!("Missing: {}", name));
                ImageOutcome::Placeholder
            }
        }
    }
}

enum ImageOutcome {
    Drawn,
    Placeholder,
}

/// Fit mode precedence: `card.artwork.fit`, then the layer, then fill.
fn fit_mode(layer: &Layer, ns: &Namespace) -> FitMode {
    match ns.get("card.artwork.fit").map(str::trim) {
        Some(mode) if !mode.is_empty() => FitMode::parse(mode),
        _ => layer.fit_mode.unwrap_or_default(),
    }
}

/// Layer font size in pixels; unusable values fall back to the default and
/// oversized ones are clamped to [`MAX_FONT_PX`].
fn font_size(size: &FontSize, ns: &Namespace) -> f32 {
    let px = match size {
        FontSize::Px(px) => Some(*px),
        FontSize::Expr(expr) => expr::substitute(expr, ns).trim().parse::<f32>().ok(),
    };
    px.filter(|p| p.is_finite() && *p > 0.0)
        .map(|p| p.min(MAX_FONT_PX))
        .unwrap_or(FontSize::DEFAULT_PX)
}

fn draw_placeholder(canvas: &mut Canvas, layer: &Layer, caption: &str) {
    let r = layer.region;
    canvas.fill_rect(r.x, r.y, r.width, r.height, PLACEHOLDER_FILL);
    canvas.stroke_rect(r.x, r.y, r.width, r.height, PLACEHOLDER_BORDER_PX, PLACEHOLDER_BORDER);

    let face = FontFace::Bitmap;
    let style = TextStyle::regular(PLACEHOLDER_TEXT_PX);
    let width = face.text_width(caption, style);
    let x = r.x as f32 + (r.width as f32 - width) / 2.0;
    let y = r.y as f32 + (r.height as f32 - PLACEHOLDER_TEXT_PX) / 2.0;
    let mask = face.rasterize(caption, style);
    canvas.draw_mask(&mask, x.round() as i32, y.round() as i32, PLACEHOLDER_TEXT);
}
