//! Persistence and rendering for buffers.
//!
//! Everything here is a view of the buffer: the JSON/JSONL documents, the
//! HTML report, the plain-text dump, and the markdown summary can all be
//! regenerated at any time, and loading a document *appends* to the target
//! buffer rather than replacing it.
//!
//! ## Usage
//!
//! ```ignore
//! use promptlog_core::persist;
//!
//! persist::write_json(&buffer, "session.json")?;
//! persist::write_html(&buffer, "session.html")?;
//!
//! let restored = Buffer::named("session");
//! persist::read_json(&restored, "session.json")?;
//!
//! let mut stdout = std::io::stdout();
//! persist::render(restored.items(), &mut stdout)?;
//! ```

pub mod html;
pub mod json;
pub mod render;
pub mod report;
pub mod structured;

// Re-exports for convenience
pub use html::write_html;
pub use json::{read_json, read_jsonl, write_json, write_jsonl};
pub use render::{render, render_to_string};
pub use report::{generate_report, write_report, LogStats, ReportOptions};
pub use structured::{to_structured, StructuredBuffer, StructuredItem};
