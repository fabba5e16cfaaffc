//! Feed persistence and background sync for todofeed.
//!
//! The server side of the pipeline: [`store::FeedStore`] keeps the
//! generated `.ics` files on disk, [`sync::SyncRunner`] turns fetched
//! todos into stored feeds, and [`scheduler::Scheduler`] drives periodic
//! runs with jitter and failure backoff.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod sync;

pub use config::{STORE_DIR_ENV, SYNC_INTERVAL_ENV, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
pub use store::{FeedMetadata, FeedStore};
pub use sync::{SyncOutcome, SyncReport, SyncRunner, SyncStatus, SyncTarget};
