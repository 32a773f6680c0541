//! # Sprite Pool Tools
//!
//! Command-line tools for development:
//! - Save checker and repairer
//! - Config validator
//! - Scenario runner

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod check;
pub mod scenario;
pub mod validate;

use std::path::PathBuf;

use sprite_core::error::PoolError;
use thiserror::Error;

/// Errors surfaced by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The pool rejected the input.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Report could not be rendered as JSON.
    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),

    /// Config could not be rendered as RON.
    #[error("Failed to encode config: {0}")]
    Ron(#[from] ron::Error),
}

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

pub(crate) fn read_file(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}
