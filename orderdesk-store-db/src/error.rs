// SPDX-FileCopyrightText: 2025 orderdesk contributors
// SPDX-License-Identifier: MIT

//! Error types for snapshot import and lookup operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for store database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during store database operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Snapshot file or data directory does not exist
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Snapshot could not be read as an array of flat objects
    #[error("invalid snapshot {}: {reason}", path.display())]
    InvalidData { path: PathBuf, reason: String },

    /// Backing store write or read failure
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Failed to open database with context
    #[error("Failed to open database at '{}': {source}", path.display())]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Lookup statement failed to execute
    #[error("Error executing query: {source}")]
    QueryFailed {
        #[source]
        source: rusqlite::Error,
    },

    /// Caller supplied no usable lookup key
    #[error("{0}")]
    InvalidArgument(String),

    /// Filesystem error with context
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn invalid_data(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means a file or directory was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Helper trait for adding context to IO errors
pub(crate) trait IoContext<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| Error::Io {
            context: f(),
            source,
        })
    }
}
