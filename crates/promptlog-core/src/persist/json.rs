//! JSON document and JSONL persistence.
//!
//! `write_json` serializes a whole buffer as one document; `write_jsonl`
//! writes one self-contained JSON line per item. Both loaders *append* to
//! whatever the target buffer already contains, preserve recorded
//! timestamps, and skip items with unknown kinds with a warning.
//!
//! None of these functions are safe against concurrent mutation of the
//! buffer being written: callers serialize access or accept a torn
//! snapshot.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::warn;

use super::structured::{to_structured, StructuredBuffer, StructuredItem};
use crate::buffer::Buffer;
use crate::error::{LogError, LogResult};
use crate::item::{Item, ItemKind};

/// Serialize the buffer to a pretty-printed JSON document at `path`.
pub fn write_json(buffer: &Buffer, path: impl AsRef<Path>) -> LogResult<()> {
    let doc = to_structured(buffer);
    let json =
        serde_json::to_string_pretty(&doc).map_err(|e| LogError::Serialization(e.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a JSON document and append its items to `buffer` in file order.
///
/// Query items are restored as verbatim metadata; their stored indices
/// describe the source buffer at record time and are not re-executed.
pub fn read_json(buffer: &Buffer, path: impl AsRef<Path>) -> LogResult<()> {
    let content = fs::read_to_string(path)?;
    let doc: StructuredBuffer =
        serde_json::from_str(&content).map_err(|e| LogError::MalformedDocument(e.to_string()))?;
    for (position, item_doc) in doc.buffer_items.iter().enumerate() {
        replay_item(buffer, item_doc, position)?;
    }
    Ok(())
}

/// Write every item as one JSON line.
///
/// The buffer name is not part of the JSONL form; each line stands alone.
pub fn write_jsonl(buffer: &Buffer, path: impl AsRef<Path>) -> LogResult<()> {
    let mut file = fs::File::create(path)?;
    for item in buffer.items() {
        let line = serde_json::to_string(&item.to_structured())
            .map_err(|e| LogError::Serialization(e.to_string()))?;
        writeln!(file, "{}", line)?;
    }
    file.flush()?;
    Ok(())
}

/// Read a JSONL file and append its items to `buffer` in line order.
///
/// Blank lines are ignored; unknown kinds are skipped with a warning, the
/// same leniency as [`read_json`].
pub fn read_jsonl(buffer: &Buffer, path: impl AsRef<Path>) -> LogResult<()> {
    let content = fs::read_to_string(path)?;
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item_doc: StructuredItem = serde_json::from_str(line)
            .map_err(|e| LogError::MalformedDocument(format!("line {}: {}", lineno + 1, e)))?;
        replay_item(buffer, &item_doc, lineno)?;
    }
    Ok(())
}

/// Append one structured item, skipping unknown kinds non-fatally.
fn replay_item(buffer: &Buffer, doc: &StructuredItem, position: usize) -> LogResult<()> {
    if ItemKind::from_wire(&doc.kind).is_none() {
        warn!(kind = %doc.kind, position, "Skipping item with unknown type");
        return Ok(());
    }
    let item = Item::from_structured(doc)?;
    buffer.append_item(item);
    Ok(())
}
