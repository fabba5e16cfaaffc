//! Core todo-to-calendar transformation engine.
//!
//! Turns todo records fetched from a note API into an iCalendar feed:
//! the time resolver picks each todo's start/end interval, the text
//! normalizer derives title and description, the encoder emits VEVENT
//! blocks, and the feed assembler wraps them in a VCALENDAR envelope.
//!
//! This crate is pure transformation. Network fetch lives in
//! `todofeed-provider`; persistence and scheduling in `todofeed-server`.

pub mod encode;
pub mod error;
pub mod feed;
pub mod resolve;
pub mod text;
pub mod todo;
pub mod tracing;
pub mod zone;

pub use encode::{encode_event, event_uid, format_utc_basic};
pub use error::{FeedError, FeedResult};
pub use feed::{assemble, assemble_from_json};
pub use resolve::{ResolvedInterval, TimeSource, resolve};
pub use text::{description_of, title_of};
pub use todo::{TodoMetadata, TodoRecord, parse_todo_records};
pub use zone::CivilZone;
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
