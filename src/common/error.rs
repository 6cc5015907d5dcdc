//! Error types for the conformance runner
//!
//! These cover setup failures only. The outcome of an individual case is a
//! [`crate::testing::TestState`] and never surfaces as an [`Error`].

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the conformance runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Catalog Errors ===
    #[error("Invalid catalog '{path}': {reason}")]
    Catalog { path: String, reason: String },

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a file read error for a path
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a catalog error for a path
    pub fn catalog(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Catalog {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_messages() {
        let err = Error::file_read(Path::new("/tmp/x.yaml"), "not found");
        assert_eq!(err.to_string(), "Failed to read file '/tmp/x.yaml': not found");

        let err = Error::catalog(Path::new("c.yaml"), "expected a sequence");
        assert_eq!(err.to_string(), "Invalid catalog 'c.yaml': expected a sequence");
    }
}
