//! Error types for specification loading.
//!
//! Provides [`DecodeError`] for files that no parse strategy could read, and
//! a unified [`LoaderError`] covering I/O, decoding, serialization, and
//! configuration failures.

use std::path::PathBuf;

use thiserror::Error;

/// A specification file that could not be decoded after every repair
/// attempt.
///
/// Position and message come from the strict JSON parse, which points at
/// the original defect rather than at text rewritten by a repair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decode {origin} at line {line}, column {column}: {message} (hint: {hint})")]
pub struct DecodeError {
    /// File path or other label of the decoded text.
    pub origin: String,
    /// 1-based line of the failure; 0 when the failure has no position.
    pub line: usize,
    /// 1-based column of the failure; 0 when the failure has no position.
    pub column: usize,
    /// Parser message.
    pub message: String,
    /// Likely defect class, for the author of the file.
    pub hint: String,
}

/// Errors that can occur while loading specifications.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Specification text could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Loader configuration is structurally valid YAML but unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The path given as a specification directory is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Convenience alias for results with [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;
