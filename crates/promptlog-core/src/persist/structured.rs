//! Structured interchange types for the on-disk document format.
//!
//! Top-level shape:
//!
//! ```json
//! { "name": "session",
//!   "buffer_items": [
//!     { "timestamp": "2026-03-01T10:00:00.000Z",
//!       "tags": { "status": "error" },
//!       "type": "event",
//!       "data": { "payload": { "code": 500 } } }
//!   ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::buffer::Buffer;
use crate::error::{LogError, LogResult};
use crate::item::{format_timestamp, parse_timestamp, Completion, Item, ItemPayload};
use crate::tags::TagMap;

/// Serialized form of a whole buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredBuffer {
    pub name: Option<String>,
    pub buffer_items: Vec<StructuredItem>,
}

/// Serialized form of one item.
///
/// `type` stays an open string at this layer so documents written by newer
/// versions still parse; loaders skip unknown kinds with a warning instead
/// of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredItem {
    pub timestamp: String,
    pub tags: TagMap,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

/// `data` shape for prompt items.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptData {
    pub prompt: String,
    pub completion: Option<CompletionData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionData {
    pub completion_timestamp: String,
    pub response: String,
}

/// `data` shape for event items.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub payload: Map<String, Value>,
}

/// `data` shape for recorded queries.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryData {
    pub op_name: String,
    pub matched_indices: Vec<usize>,
}

impl Item {
    /// Serialize to the structured interchange shape.
    pub fn to_structured(&self) -> StructuredItem {
        let data = match self.payload() {
            ItemPayload::Prompt { prompt, completion } => {
                let completion = completion.as_ref().map(|c| {
                    json!({
                        "completion_timestamp": format_timestamp(c.completed_at),
                        "response": c.response,
                    })
                });
                json!({ "prompt": prompt, "completion": completion })
            }
            ItemPayload::Event { payload } => json!({ "payload": payload }),
            ItemPayload::Query {
                op_name,
                matched_indices,
            } => json!({ "op_name": op_name, "matched_indices": matched_indices }),
        };
        StructuredItem {
            timestamp: format_timestamp(self.timestamp()),
            tags: self.tags().clone(),
            kind: self.kind().to_string(),
            data,
        }
    }

    /// Rebuild an item from its structured shape.
    ///
    /// Exact inverse of [`Item::to_structured`] for prompt and event items;
    /// recorded queries come back as verbatim metadata.
    pub fn from_structured(doc: &StructuredItem) -> LogResult<Item> {
        let timestamp = parse_timestamp(&doc.timestamp)?;
        let payload = match doc.kind.as_str() {
            "prompt" => {
                let data: PromptData = parse_data(&doc.data, "prompt")?;
                let completion = data
                    .completion
                    .map(|c| -> LogResult<Completion> {
                        Ok(Completion {
                            completed_at: parse_timestamp(&c.completion_timestamp)?,
                            response: c.response,
                        })
                    })
                    .transpose()?;
                ItemPayload::Prompt {
                    prompt: data.prompt,
                    completion,
                }
            }
            "event" => {
                let data: EventData = parse_data(&doc.data, "event")?;
                ItemPayload::Event {
                    payload: data.payload,
                }
            }
            "query" => {
                let data: QueryData = parse_data(&doc.data, "query")?;
                ItemPayload::Query {
                    op_name: data.op_name,
                    matched_indices: data.matched_indices,
                }
            }
            other => {
                return Err(LogError::MalformedDocument(format!(
                    "unknown item type '{}'",
                    other
                )))
            }
        };
        Ok(Item::new(timestamp, doc.tags.clone(), payload))
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(data: &Value, kind: &str) -> LogResult<T> {
    serde_json::from_value(data.clone())
        .map_err(|e| LogError::MalformedDocument(format!("{} data: {}", kind, e)))
}

/// Snapshot a buffer into its structured interchange shape.
pub fn to_structured(buffer: &Buffer) -> StructuredBuffer {
    StructuredBuffer {
        name: buffer.name().map(str::to_owned),
        buffer_items: buffer.items().iter().map(Item::to_structured).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagValue;

    #[test]
    fn test_event_roundtrip_is_exact() {
        let buffer = Buffer::new();
        let mut payload = Map::new();
        payload.insert("code".to_string(), json!(500));
        payload.insert("detail".to_string(), json!({"path": "/api"}));
        let mut tags = TagMap::new();
        tags.insert("status".to_string(), TagValue::from("error"));
        buffer.record_event(payload, tags);

        let original = buffer.item_at(0).unwrap();
        let doc = original.to_structured();
        let restored = Item::from_structured(&doc).unwrap();

        // Timestamps compare at serialized granularity
        assert_eq!(restored.to_structured().timestamp, doc.timestamp);
        assert_eq!(restored.tags(), original.tags());
        assert_eq!(restored.event_payload().unwrap(), original.event_payload().unwrap());
    }

    #[test]
    fn test_prompt_roundtrip_with_completion() {
        let buffer = Buffer::new();
        let handle = buffer.record_prompt_start("2+2?", TagMap::new());
        handle.complete("4").unwrap();

        let original = buffer.item_at(0).unwrap();
        let doc = original.to_structured();
        assert_eq!(doc.kind, "prompt");

        let restored = Item::from_structured(&doc).unwrap();
        assert_eq!(restored.prompt().unwrap(), "2+2?");
        assert_eq!(restored.completion().unwrap().unwrap().response, "4");
        assert_eq!(restored.to_structured().data, doc.data);
    }

    #[test]
    fn test_incomplete_prompt_serializes_null_completion() {
        let buffer = Buffer::new();
        buffer.record_prompt_start("pending", TagMap::new());
        let doc = buffer.item_at(0).unwrap().to_structured();
        assert_eq!(doc.data["completion"], Value::Null);

        let restored = Item::from_structured(&doc).unwrap();
        assert!(restored.completion().unwrap().is_none());
    }

    #[test]
    fn test_query_restored_as_metadata() {
        let doc = StructuredItem {
            timestamp: "2026-03-01T10:00:00.000Z".to_string(),
            tags: TagMap::new(),
            kind: "query".to_string(),
            data: json!({ "op_name": "last[2](all)", "matched_indices": [3, 4] }),
        };
        let item = Item::from_structured(&doc).unwrap();
        let (op, matched) = item.query_record().unwrap();
        assert_eq!(op, "last[2](all)");
        assert_eq!(matched, &[3, 4]);
    }

    #[test]
    fn test_unknown_kind_is_an_error_here() {
        let doc = StructuredItem {
            timestamp: "2026-03-01T10:00:00.000Z".to_string(),
            tags: TagMap::new(),
            kind: "metric".to_string(),
            data: json!({}),
        };
        let err = Item::from_structured(&doc).unwrap_err();
        assert!(matches!(err, LogError::MalformedDocument(_)));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let doc = StructuredItem {
            timestamp: "2026-03-01T10:00:00.000Z".to_string(),
            tags: TagMap::new(),
            kind: "prompt".to_string(),
            data: json!({}),
        };
        let err = Item::from_structured(&doc).unwrap_err();
        assert!(matches!(err, LogError::MalformedDocument(_)));
    }

    #[test]
    fn test_to_structured_buffer_shape() {
        let buffer = Buffer::named("session");
        buffer.record_prompt_start("q", TagMap::new());
        let doc = to_structured(&buffer);
        assert_eq!(doc.name.as_deref(), Some("session"));
        assert_eq!(doc.buffer_items.len(), 1);
    }
}
