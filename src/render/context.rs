//! Render context: shared resources available to every card render.
//!
//! One context is built per run and shared by all worker threads. Decoded
//! images and loaded fonts are cached by resolved location; the caches are
//! read-through and never evicted, and two threads missing on the same key
//! may both load it (the later insert wins, both results are identical).

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use image::DynamicImage;

use super::assets::{AssetRef, Fetcher};
use super::font::FontFace;
use crate::error::{CardgenError, Result};

const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// Shared caches and the asset fetcher.
pub struct RenderContext {
    fetcher: Fetcher,
    images: RwLock<HashMap<String, Arc<DynamicImage>>>,
    fonts: RwLock<HashMap<String, FontFace>>,
}

impl RenderContext {
    /// Create a context with network access (when built with `remote`).
    pub fn new() -> Self {
        Self::with_fetcher(Fetcher::new())
    }

    /// Create a minimal context for tests: empty caches, no network.
    pub fn empty() -> Self {
        Self::with_fetcher(Fetcher::offline())
    }

    pub fn with_fetcher(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            images: RwLock::new(HashMap::new()),
            fonts: RwLock::new(HashMap::new()),
        }
    }

    /// Load and decode an image, using the cache when possible.
    ///
    /// `dirs` are the directories relative paths are resolved against, in
    /// order.
    pub fn load_image(&self, raw: &str, dirs: &[&Path]) -> Result<Arc<DynamicImage>> {
        if raw.trim().is_empty() {
            return Err(CardgenError::Asset("empty image source".into()));
        }
        let asset = AssetRef::locate(raw, dirs);
        let key = asset.key();

        if let Some(img) = self
            .images
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            tracing::trace!(%asset, "image cache hit");
            return Ok(Arc::clone(img));
        }

        let bytes = self.fetcher.read(&asset)?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| CardgenError::Asset(format!("failed to decode {}: {}", asset, e)))?;
        let img = Arc::new(img);
        tracing::debug!(%asset, width = img.width(), height = img.height(), "loaded image");

        self.images
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&img));
        Ok(img)
    }

    /// Font face for a layer's `font.family`.
    ///
    /// A family naming a `.ttf`/`.otf` file is loaded relative to
    /// `template_dir`; anything else, or a font that fails to load, is the
    /// built-in bitmap face.
    pub fn font(&self, family: &str, template_dir: &Path) -> FontFace {
        let family = family.trim();
        let is_font_file = Path::new(family)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FONT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if !is_font_file {
            return FontFace::Bitmap;
        }

        let asset = AssetRef::locate(family, &[template_dir]);
        let key = asset.key();
        if let Some(face) = self
            .fonts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return face.clone();
        }

        let face = self
            .fetcher
            .read(&asset)
            .and_then(FontFace::from_bytes)
            .unwrap_or_else(|e| {
                tracing::warn!(font = %asset, error = %e, "falling back to built-in font");
                FontFace::Bitmap
            });

        self.fonts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, face.clone());
        face
    }

    /// Number of decoded images held in the cache.
    pub fn cached_images(&self) -> usize {
        self.images
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}
