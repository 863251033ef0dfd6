//! Error types for the case tester
//!
//! Suite-level errors (a broken case file, misconfiguration, an unreachable
//! database) live here. Per-case lifecycle failures are carried by
//! [`CaseError`] and wrapped into [`Error::Case`] when they end a run.

use thiserror::Error;

use crate::testing::CaseError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the case tester
#[derive(Error, Debug)]
pub enum Error {
    // === Case Source Errors ===
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("malformed case: {0}")]
    MalformedElement(String),

    // === Run Errors ===
    #[error("case '{name}' failed: {source}")]
    Case {
        name: String,
        #[source]
        source: CaseError,
    },

    #[error("{errored} case(s) failed with errors")]
    SuiteFailed { errored: usize },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Collaborator Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create a file read error for a path
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// The case error behind this error, if a case ended the run
    pub fn case_error(&self) -> Option<&CaseError> {
        match self {
            Self::Case { source, .. } => Some(source),
            _ => None,
        }
    }
}
