//! Error types for Distill.
//!
//! Library crates return [`DistillError`] via `thiserror`. Degenerate input
//! (empty HTML, blank query, empty corpus) is never an error; it resolves to an
//! empty result at the call site.

use std::path::PathBuf;

/// Top-level error type for all Distill operations.
#[derive(Debug, thiserror::Error)]
pub enum DistillError {
    /// A caller broke a parameter contract (zero window, mismatched vector dimensions).
    #[error("contract violation: {message}")]
    Contract { message: String },

    /// Tokenizer could not be loaded or could not decode a token slice.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Text-completion provider failure during AI polish.
    #[error("polish error: {0}")]
    Polish(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DistillError>;

impl DistillError {
    /// Create a contract violation from any displayable message.
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a caller-side contract violation.
    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract { .. })
    }
}
