//! Deterministic plain-text dump of item sequences.
//!
//! A pure function of the input: the same items always render to the same
//! bytes, which makes the output diffable in test fixtures. Both a buffer
//! snapshot and a query result render through the same path.

use std::io::Write;

use crate::error::LogResult;
use crate::item::Item;

/// Write each item's multi-line block to `out`, one blank line between
/// items.
pub fn render<W: Write>(items: impl IntoIterator<Item = Item>, out: &mut W) -> LogResult<()> {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        out.write_all(item.render_text().as_bytes())?;
    }
    Ok(())
}

/// Render to an owned string.
pub fn render_to_string(items: impl IntoIterator<Item = Item>) -> String {
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&item.render_text());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use crate::tags::{TagMap, TagValue};
    use serde_json::Map;

    fn sample_buffer() -> Buffer {
        let buffer = Buffer::new();
        let mut tags = TagMap::new();
        tags.insert("status".to_string(), TagValue::from("error"));
        buffer.record_event(Map::new(), tags);
        let handle = buffer.record_prompt_start("2+2?", TagMap::new());
        handle.complete("4").unwrap();
        buffer
    }

    #[test]
    fn test_render_matches_render_to_string() {
        let buffer = sample_buffer();
        let mut bytes = Vec::new();
        render(buffer.items(), &mut bytes).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), render_to_string(buffer.items()));
    }

    #[test]
    fn test_blank_line_between_items() {
        let buffer = sample_buffer();
        let text = render_to_string(buffer.items());
        let blocks: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("kind = event"));
        assert!(blocks[1].contains("kind = prompt"));
    }

    #[test]
    fn test_query_renders_like_its_items() {
        let buffer = sample_buffer();
        let query = buffer.last(1);
        let from_query = render_to_string(query.items());
        let from_buffer = render_to_string(vec![buffer.item_at(1).unwrap()]);
        assert_eq!(from_query, from_buffer);
    }

    #[test]
    fn test_empty_sequence_renders_empty() {
        assert_eq!(render_to_string(Vec::new()), "");
    }
}
