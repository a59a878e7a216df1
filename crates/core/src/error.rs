//! Error types for rolemark operations.
//!
//! The labeling engine itself has no fatal conditions: odd identifiers,
//! ambiguous classifications, stray end tags and writes after a flush are all
//! defined outcomes. Errors only come from the collaborators around it: the
//! tokenizer driving the engine, configuration files and serialization.
//!
//! # Example
//!
//! ```rust
//! use rolemark_core::{LabelConfig, RolemarkError, Result};
//!
//! fn load(json: &str) -> Result<LabelConfig> {
//!     if json.trim().is_empty() {
//!         return Err(RolemarkError::ConfigError("empty configuration".to_string()));
//!     }
//!     LabelConfig::from_json(json)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for labeling operations.
#[derive(Error, Debug)]
pub enum RolemarkError {
    /// The streaming tokenizer rejected the input.
    ///
    /// Wraps errors raised by `lol_html` while feeding chunks to the
    /// [`LabelRewriter`](crate::LabelRewriter).
    #[error("HTML rewriting failed: {0}")]
    RewriteError(#[from] lol_html::errors::RewritingError),

    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O errors while reading configuration or input.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors.
    ///
    /// Returned when a configuration document is malformed. Override lists
    /// never produce this error; malformed entries are resolved instead.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON (de)serialization errors.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type alias for RolemarkError.
pub type Result<T> = std::result::Result<T, RolemarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RolemarkError::ConfigError("bad thresholds".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("bad thresholds"));
    }

    #[test]
    fn test_file_not_found_error() {
        let err = RolemarkError::FileNotFound(PathBuf::from("/nowhere/rolemark.json"));
        assert!(err.to_string().contains("/nowhere/rolemark.json"));
    }

    #[test]
    fn test_serialization_error_from() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: RolemarkError = parse_err.into();
        assert!(matches!(err, RolemarkError::SerializationError(_)));
    }
}
