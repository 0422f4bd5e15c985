//! # Cardstyles
//!
//! A cardstyle is a YAML document describing the canvas size and the ordered
//! list of layers painted onto it. Cardstyles can inherit from each other
//! with `extends`; the [`Resolver`] finds a cardstyle across the search
//! tiers, walks its `extends` chain and returns a fully merged [`Template`].
//!
//! ```yaml
//! name: MTG Full Art
//! tcg: mtg
//! extends: ./default.yaml
//! overrides:
//!   - layer: artwork
//!     fit_mode: fit
//! additional_layers:
//!   - name: watermark
//!     type: text
//!     region: { x: 40, y: 900, width: 665, height: 30 }
//!     content: "{{card.set}}"
//! ```
//!
//! Layer order is paint order: later layers are drawn on top.

mod builtin;
mod discover;
pub mod merge;
mod resolve;
mod validate;

pub use builtin::{BUILTIN_PREFIX, builtin_bytes};
pub(crate) use builtin::asset_path as builtin_asset_path;
pub use discover::{CardstyleInfo, CardstyleSource};
pub use resolve::{MAX_EXTENDS_DEPTH, Resolver, SearchPaths};
pub use validate::validate_card;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{CardgenError, Result};

/// A cardstyle definition, either as read from disk or fully resolved.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Template {
    pub name: String,
    pub tcg: String,
    pub version: String,
    pub description: String,
    /// Base template reference: a path relative to this file, or a logical
    /// `tcg/style` name. Always `None` on a resolved template.
    pub extends: Option<String>,
    pub dimensions: Dimensions,
    /// Canvas fill color (`#rrggbb`). White when unset.
    pub background: Option<String>,
    pub layers: Vec<Layer>,
    #[serde(rename = "required_fields")]
    pub required: Vec<String>,
    /// Field defaults, also injected into the render namespace.
    #[serde(rename = "optional_fields")]
    pub optional: BTreeMap<String, serde_yaml::Value>,
    pub icons: BTreeMap<String, String>,
    pub style_tokens: BTreeMap<String, String>,
    pub overrides: Vec<LayerOverride>,
    pub additional_layers: Vec<Layer>,
    /// Directory the template was read from; `builtin/<tcg>` for embedded ones.
    #[serde(skip)]
    pub template_dir: PathBuf,
}

impl Template {
    /// Parse a template document. `origin` is only used in error messages.
    pub fn from_yaml(text: &str, origin: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| CardgenError::TemplateParse {
            origin: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Check the invariants of a resolved template.
    pub fn check(&self) -> Result<()> {
        if self.dimensions.width == 0 || self.dimensions.height == 0 {
            return Err(CardgenError::InvalidTemplate(format!(
                "{}/{}: dimensions must be non-zero (got {}x{})",
                self.tcg, self.name, self.dimensions.width, self.dimensions.height
            )));
        }
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.name.as_str()) {
                return Err(CardgenError::InvalidTemplate(format!(
                    "{}/{}: duplicate layer name '{}'",
                    self.tcg, self.name, layer.name
                )));
            }
        }
        Ok(())
    }
}

/// Output canvas size. A zero width inherits the base template's dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One visual element of a cardstyle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Layer {
    pub name: String,
    /// Semantic tag (title, artwork, ...); informational only.
    pub role: Option<String>,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub region: Region,

    // Image layers
    pub source: String,
    pub fallback: String,
    pub fit_mode: Option<FitMode>,

    // Text layers
    pub content: String,
    pub font: Option<Font>,
    pub align: Align,
    pub strip_headers: bool,
    pub icon_replace: bool,

    /// Gate expression; blank means always paint.
    pub condition: String,
}

/// What a layer draws.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LayerKind {
    Image,
    Text,
    /// Anything else. Rejected when the layer is rendered.
    Other(String),
}

impl Default for LayerKind {
    fn default() -> Self {
        LayerKind::Other(String::new())
    }
}

impl From<String> for LayerKind {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => LayerKind::Image,
            "text" => LayerKind::Text,
            _ => LayerKind::Other(s),
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Image => f.write_str("image"),
            LayerKind::Text => f.write_str("text"),
            LayerKind::Other(s) if s.is_empty() => f.write_str("(none)"),
            LayerKind::Other(s) => f.write_str(s),
        }
    }
}

/// How an image is mapped into its region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum FitMode {
    /// Uniform scale to cover the region, center-cropped.
    #[default]
    Fill,
    /// Uniform scale to fit inside the region, centered.
    Fit,
    /// Independent x/y scale to exactly the region.
    Stretch,
    /// Native size, centered.
    Center,
}

impl FitMode {
    /// Parse a mode name; unknown names are `Fill`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" => FitMode::Fit,
            "stretch" => FitMode::Stretch,
            "center" => FitMode::Center,
            _ => FitMode::Fill,
        }
    }
}

impl From<String> for FitMode {
    fn from(s: String) -> Self {
        FitMode::parse(&s)
    }
}

/// Horizontal text alignment within a region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl From<String> for Align {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" | "centre" => Align::Center,
            "right" => Align::Right,
            _ => Align::Left,
        }
    }
}

/// Text styling for a layer. String fields may contain `{{...}}` references.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Font {
    /// Path to a `.ttf`/`.otf` file; anything else selects the built-in face.
    pub family: String,
    pub size: FontSize,
    pub weight: String,
    pub style: String,
    pub color: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: String::new(),
            size: FontSize::default(),
            weight: String::new(),
            style: String::new(),
            color: "#000000".to_string(),
        }
    }
}

/// Font size: a pixel value or a templated string like `"{{mtg.font_size.title}}"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FontSize {
    Px(f32),
    Expr(String),
}

impl FontSize {
    pub const DEFAULT_PX: f32 = 12.0;
}

impl Default for FontSize {
    fn default() -> Self {
        FontSize::Px(Self::DEFAULT_PX)
    }
}

/// Field updates applied to a base layer before merging.
///
/// Only `source`, `content`, `condition` and `fit_mode` string values are
/// honoured; other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LayerOverride {
    pub layer: String,
    #[serde(flatten)]
    pub updates: BTreeMap<String, serde_yaml::Value>,
}
