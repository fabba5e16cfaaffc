//! Server error types.

use std::io;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (store directory, feed files).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Note API error during a sync.
    #[error("API error: {0}")]
    Api(#[from] todofeed_provider::ApiError),

    /// Feed assembly error.
    #[error("feed error: {0}")]
    Feed(#[from] todofeed_core::FeedError),

    /// Serialization error for store metadata.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store directory missing or not a directory.
    #[error("store directory invalid: {path}")]
    StoreDirInvalid { path: String },

    /// Feed filename rejected (wrong extension or path components).
    #[error("invalid feed filename: {name}")]
    InvalidFilename { name: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a store directory error.
    pub fn store_dir_invalid(path: impl Into<String>) -> Self {
        Self::StoreDirInvalid { path: path.into() }
    }

    /// Creates an invalid filename error.
    pub fn invalid_filename(name: impl Into<String>) -> Self {
        Self::InvalidFilename { name: name.into() }
    }
}
