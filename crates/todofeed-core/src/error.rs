//! Engine error types.
//!
//! The transformation engine absorbs per-record anomalies (bad dates, empty
//! content) via fallbacks, so the only error it can surface is a top-level
//! input that is not a todo list at all.

use thiserror::Error;

/// Result type for engine operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors surfaced by the feed engine.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The top-level input could not be interpreted as a todo list.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl FeedError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
