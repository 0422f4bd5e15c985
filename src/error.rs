//! # Error Types
//!
//! This module defines error types used throughout the cardgen library.
//!
//! Errors are grouped by how far they propagate:
//!
//! | Group | Variants | Scope |
//! |-------|----------|-------|
//! | Parse | `Parse` | fatal for the card |
//! | Template | `CardstyleNotFound`, `BaseTemplateNotFound`, `CyclicTemplate`, `TemplateParse`, `InvalidTemplate` | fatal for the card |
//! | Validation | `Validation` | fatal for the card |
//! | Layer | `Layer`, `UnknownLayerType` | fatal for the card |
//! | Asset | `Asset` | recovered inside the compositor |

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for cardgen operations
#[derive(Debug, Error)]
pub enum CardgenError {
    /// Malformed card source file
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// No search tier had the requested cardstyle
    #[error("Cardstyle {tcg}/{style} not found")]
    CardstyleNotFound { tcg: String, style: String },

    /// An `extends` reference could not be resolved
    #[error("Base template '{reference}' not found: {source}")]
    BaseTemplateNotFound {
        reference: String,
        #[source]
        source: Box<CardgenError>,
    },

    /// `extends` chain revisits a template or is too deep
    #[error("Cyclic template inheritance: {chain}")]
    CyclicTemplate { chain: String },

    /// Template document could not be deserialized
    #[error("Failed to parse cardstyle {origin}: {message}")]
    TemplateParse { origin: String, message: String },

    /// Resolved template violates a structural invariant
    #[error("Invalid cardstyle: {0}")]
    InvalidTemplate(String),

    /// Card does not satisfy its cardstyle
    #[error("Card validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A layer failed to render
    #[error("Error rendering layer '{layer}': {source}")]
    Layer {
        layer: String,
        #[source]
        source: Box<CardgenError>,
    },

    /// Layer declares a type the compositor cannot draw
    #[error("Unknown layer type: {0}")]
    UnknownLayerType(String),

    /// Image or font asset could not be loaded
    #[error("Asset error: {0}")]
    Asset(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CardgenError {
    /// Wrap an error with the name of the layer that produced it.
    pub fn in_layer(self, layer: &str) -> Self {
        CardgenError::Layer {
            layer: layer.to_string(),
            source: Box::new(self),
        }
    }
}

/// Reasons a card fails validation against its cardstyle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("required field '{field}' is missing")]
    MissingField { field: String },

    #[error(
        "card TCG '{card}' doesn't match template TCG '{template}' - use a {card} cardstyle for {card} cards"
    )]
    TcgMismatch { card: String, template: String },
}

pub type Result<T, E = CardgenError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_error_names_layer() {
        let err = CardgenError::UnknownLayerType("video".into()).in_layer("artwork");
        let msg = err.to_string();
        assert!(msg.contains("artwork"));
        assert!(msg.contains("video"));
    }

    #[test]
    fn test_tcg_mismatch_names_both() {
        let err = ValidationError::TcgMismatch {
            card: "pokemon".into(),
            template: "mtg".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pokemon"));
        assert!(msg.contains("mtg"));
    }
}
