//! Error types for record storage and replay.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised while creating, writing or replaying record files.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The output directory could not be created.
    #[error("failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record file could not be opened.
    #[error("failed to open '{path}': {source}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A replay file held no complete record.
    #[error("no samples found in replay file '{path}'")]
    EmptyReplay { path: PathBuf },

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
