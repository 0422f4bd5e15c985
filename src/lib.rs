//! # cardgen - Trading Card Image Generator
//!
//! cardgen renders trading-card PNGs from Markdown files with a YAML
//! metadata block, using declarative cardstyle templates. It provides:
//!
//! - **Card parsing**: frontmatter metadata, typed core fields, body splitting
//! - **Cardstyles**: tiered template discovery with `extends` inheritance
//! - **Rendering**: `{{path}}` substitution, a markdown subset, word-wrapped
//!   text layout and fill/fit/stretch/center image placement
//! - **Batch generation**: parallel rendering of whole card directories
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use cardgen::generator::{Generator, GeneratorConfig, Outcome};
//!
//! let generator = Generator::new(GeneratorConfig::default());
//! match generator.generate_card(Path::new("cards/lightning_bolt.md"))? {
//!     Outcome::Rendered(png) => println!("wrote {}", png.display()),
//!     Outcome::Validated => {}
//! }
//! # Ok::<(), cardgen::CardgenError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`card`] | Card model and Markdown/YAML parser |
//! | [`cardstyle`] | Templates, resolver, merge, validation, listing |
//! | [`render`] | Layer compositor and its building blocks |
//! | [`generator`] | Per-file pipeline and batch driver |
//! | [`error`] | Error types |

pub mod card;
pub mod cardstyle;
pub mod error;
pub mod generator;
pub mod render;

// Re-exports for convenience
pub use card::Card;
pub use cardstyle::{Resolver, SearchPaths, Template};
pub use error::{CardgenError, Result, ValidationError};
pub use generator::{Generator, GeneratorConfig};
pub use render::{CardRenderer, RenderContext};
