//! Error taxonomy for extraction, merging and the surrounding I/O.
//!
//! Fatal conditions are [`EngineError`] values and abort only the article or
//! target document they belong to. Recoverable conditions found while merging
//! are reported as [`crate::models::MergeWarning`] alongside a successful
//! outcome instead.

use crate::models::Field;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the extraction and merge engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required element of an article document was absent or empty.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: Field },

    /// None of the configured encodings decoded the document cleanly.
    #[error("unreadable encoding (tried {})", tried.join(", "))]
    UnreadableEncoding { tried: Vec<String> },

    /// The target document has no usable START marker or container.
    #[error("invalid target structure: {reason}")]
    InvalidTargetStructure { reason: String },

    #[error("i/o failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn missing(field: Field) -> Self {
        EngineError::MissingRequiredField { field }
    }

    pub fn structure(reason: impl Into<String>) -> Self {
        EngineError::InvalidTargetStructure {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}
