//! The todo-source abstraction.
//!
//! [`TodoSource`] is the seam between sync orchestration and the concrete
//! HTTP client, so the sync path can be exercised against an in-memory
//! source in tests.

use std::future::Future;
use std::pin::Pin;

use todofeed_core::TodoRecord;

use crate::client::NoteApiClient;
use crate::config::FetchQuery;
use crate::error::ApiResult;

/// A boxed future, keeping the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can produce todo records for a query.
pub trait TodoSource: Send + Sync {
    /// Fetches todo records matching the query.
    fn fetch_todos<'a>(&'a self, query: &'a FetchQuery) -> BoxFuture<'a, ApiResult<Vec<TodoRecord>>>;
}

impl TodoSource for NoteApiClient {
    fn fetch_todos<'a>(&'a self, query: &'a FetchQuery) -> BoxFuture<'a, ApiResult<Vec<TodoRecord>>> {
        Box::pin(self.fetch_todos(query))
    }
}
