//! Note API client for todofeed.
//!
//! This crate owns the network boundary: it fetches todo-type notes from
//! the external note API and returns them as `todofeed_core::TodoRecord`s.
//! Everything downstream of the fetch is pure transformation in
//! `todofeed-core`.

pub mod client;
pub mod config;
pub mod error;
pub mod source;

pub use client::NoteApiClient;
pub use config::{ApiConfig, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT, FetchQuery};
pub use error::{ApiError, ApiErrorCode, ApiResult};
pub use source::{BoxFuture, TodoSource};
