//! promptlog core library
//!
//! Structured, append-only interaction log for AI prompt/completion cycles
//! and arbitrary tagged events, with a composable query algebra and
//! persistence/rendering for offline inspection.
//!
//! ## Overview
//!
//! - **Append-only buffers**: named, growable stores of immutable items;
//!   indices never move, so queries stay valid as the log grows
//! - **Prompt call handles**: record a prompt now, attach its completion
//!   later, possibly from another thread
//! - **Index-set queries**: chainable filter/slice/set operations that scan
//!   result sets, not the whole buffer
//! - **Views on demand**: JSON/JSONL documents, an offline HTML report, a
//!   deterministic plain-text dump, and a markdown summary
//!
//! ## Quick Start
//!
//! ```
//! use promptlog_core::{Buffer, FilterMode, TagFilter, TagMap, TagValue};
//!
//! let buffer = Buffer::named("session");
//!
//! // Record a prompt, complete it when the response arrives
//! let handle = buffer.record_prompt_start("What is 2+2?", TagMap::new());
//! handle.complete("4").unwrap();
//!
//! // Record a tagged event
//! let mut payload = serde_json::Map::new();
//! payload.insert("code".to_string(), serde_json::json!(500));
//! let mut tags = TagMap::new();
//! tags.insert("status".to_string(), TagValue::from("error"));
//! buffer.record_event(payload, tags);
//!
//! // Query it back
//! let errors = buffer.filter(&TagFilter::new().with("status", "error"), FilterMode::Any);
//! assert_eq!(errors.len(), 1);
//! ```

pub mod buffer;
pub mod clock;
pub mod error;
pub mod item;
pub mod persist;
pub mod query;
pub mod registry;
pub mod tags;

// Re-exports
pub use buffer::{Buffer, CallHandle};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LogError, LogResult};
pub use item::{Completion, Item, ItemKind, ItemPayload};
pub use query::Query;
pub use registry::BufferRegistry;
pub use tags::{FilterMode, TagFilter, TagMap, TagValue};
