//! Self-contained HTML report with the structured document embedded.
//!
//! The template is static; the only contract is the single injection point
//! that receives the structured buffer as an embedded script variable. The
//! embedded payload is the exact document [`super::json::write_json`]
//! produces, so the two outputs differ only in envelope.

use std::fs;
use std::path::Path;

use super::structured::to_structured;
use crate::buffer::Buffer;
use crate::error::{LogError, LogResult};

const TEMPLATE: &str = include_str!("template.html");
const INJECTION_POINT: &str = "/*__BUFFER_JSON__*/null";

/// Write a browsable, offline HTML report for the buffer.
pub fn write_html(buffer: &Buffer, path: impl AsRef<Path>) -> LogResult<()> {
    let doc = to_structured(buffer);
    let json = serde_json::to_string(&doc).map_err(|e| LogError::Serialization(e.to_string()))?;
    // A literal "</script>" inside string data would end the inline script
    let json = json.replace("</", "<\\/");
    let html = TEMPLATE.replacen(INJECTION_POINT, &json, 1);
    fs::write(path, html)?;
    Ok(())
}
