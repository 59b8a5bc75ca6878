//! Log item types: one immutable entry per recorded prompt, event, or query.
//!
//! Items are constructed only by their owning buffer and never change once
//! finalized; the single exception is a prompt's completion, which is
//! attached at most once through the buffer's guarded transition.

use std::fmt;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LogError, LogResult};
use crate::tags::TagMap;

/// Discriminator distinguishing the three payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Prompt,
    Event,
    Query,
}

impl ItemKind {
    /// Wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Prompt => "prompt",
            ItemKind::Event => "event",
            ItemKind::Query => "query",
        }
    }

    /// Parse a wire tag; `None` for kinds this version does not know.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "prompt" => Some(ItemKind::Prompt),
            "event" => Some(ItemKind::Event),
            "query" => Some(ItemKind::Query),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response attached to a prompt item when its call finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// When the completion arrived
    pub completed_at: DateTime<Utc>,
    /// The response text
    pub response: String,
}

/// Kind-specific payload of an item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPayload {
    /// A prompt/completion cycle; `completion` is absent until the call
    /// finishes and immutable afterwards.
    Prompt {
        prompt: String,
        completion: Option<Completion>,
    },
    /// An arbitrary structured event, stored and returned verbatim.
    Event { payload: Map<String, Value> },
    /// A recorded query: its provenance string and the indices it matched
    /// at record time.
    Query {
        op_name: String,
        matched_indices: Vec<usize>,
    },
}

impl ItemPayload {
    fn kind(&self) -> ItemKind {
        match self {
            ItemPayload::Prompt { .. } => ItemKind::Prompt,
            ItemPayload::Event { .. } => ItemKind::Event,
            ItemPayload::Query { .. } => ItemKind::Query,
        }
    }
}

/// One log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    timestamp: DateTime<Utc>,
    tags: TagMap,
    pub(crate) payload: ItemPayload,
}

impl Item {
    pub(crate) fn new(timestamp: DateTime<Utc>, tags: TagMap, payload: ItemPayload) -> Self {
        Self {
            timestamp,
            tags,
            payload,
        }
    }

    /// When the item was recorded. For prompts this is the moment recording
    /// started; the completion carries its own timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Tags attached at record time.
    pub fn tags(&self) -> &TagMap {
        &self.tags
    }

    /// The payload discriminator.
    pub fn kind(&self) -> ItemKind {
        self.payload.kind()
    }

    /// The kind-specific payload, for direct pattern matching.
    pub fn payload(&self) -> &ItemPayload {
        &self.payload
    }

    /// The prompt text. Fails with `WrongKind` on non-prompt items.
    pub fn prompt(&self) -> LogResult<&str> {
        match &self.payload {
            ItemPayload::Prompt { prompt, .. } => Ok(prompt),
            other => Err(wrong_kind(ItemKind::Prompt, other.kind())),
        }
    }

    /// The completion, if the call has finished. Fails with `WrongKind` on
    /// non-prompt items.
    pub fn completion(&self) -> LogResult<Option<&Completion>> {
        match &self.payload {
            ItemPayload::Prompt { completion, .. } => Ok(completion.as_ref()),
            other => Err(wrong_kind(ItemKind::Prompt, other.kind())),
        }
    }

    /// The event payload. Fails with `WrongKind` on non-event items.
    pub fn event_payload(&self) -> LogResult<&Map<String, Value>> {
        match &self.payload {
            ItemPayload::Event { payload } => Ok(payload),
            other => Err(wrong_kind(ItemKind::Event, other.kind())),
        }
    }

    /// The recorded query's description and matched indices. Fails with
    /// `WrongKind` on non-query items.
    pub fn query_record(&self) -> LogResult<(&str, &[usize])> {
        match &self.payload {
            ItemPayload::Query {
                op_name,
                matched_indices,
            } => Ok((op_name, matched_indices)),
            other => Err(wrong_kind(ItemKind::Query, other.kind())),
        }
    }

    /// Deterministic multi-line rendering used for the plain-text dump.
    ///
    /// Every field appears, nested payload data is indented, and identical
    /// input always produces identical output.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        writeln!(out, "timestamp = {}", format_timestamp(self.timestamp)).unwrap();
        writeln!(out, "kind = {}", self.kind()).unwrap();
        if self.tags.is_empty() {
            writeln!(out, "tags = (none)").unwrap();
        } else {
            writeln!(out, "tags:").unwrap();
            for (key, value) in &self.tags {
                writeln!(out, "  {} = {}", key, value).unwrap();
            }
        }
        match &self.payload {
            ItemPayload::Prompt { prompt, completion } => {
                writeln!(out, "prompt = {:?}", prompt).unwrap();
                match completion {
                    Some(c) => {
                        writeln!(out, "completion:").unwrap();
                        writeln!(out, "  completed_at = {}", format_timestamp(c.completed_at))
                            .unwrap();
                        writeln!(out, "  response = {:?}", c.response).unwrap();
                    }
                    None => writeln!(out, "completion = (pending)").unwrap(),
                }
            }
            ItemPayload::Event { payload } => {
                if payload.is_empty() {
                    writeln!(out, "payload = {{}}").unwrap();
                } else {
                    writeln!(out, "payload:").unwrap();
                    for (key, value) in payload {
                        writeln!(out, "  {} = {}", key, value).unwrap();
                    }
                }
            }
            ItemPayload::Query {
                op_name,
                matched_indices,
            } => {
                writeln!(out, "operation = {}", op_name).unwrap();
                writeln!(out, "matched = {:?}", matched_indices).unwrap();
            }
        }
        out
    }
}

fn wrong_kind(expected: ItemKind, found: ItemKind) -> LogError {
    LogError::WrongKind(format!("expected {}, found {}", expected, found))
}

/// RFC 3339 with millisecond precision and `Z` suffix; the one timestamp
/// form used on the wire and in rendered output.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(s: &str) -> LogResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LogError::MalformedDocument(format!("bad timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagValue;

    fn sample_timestamp() -> DateTime<Utc> {
        parse_timestamp("2026-03-01T10:00:00.000Z").unwrap()
    }

    fn prompt_item(completed: bool) -> Item {
        let completion = completed.then(|| Completion {
            completed_at: parse_timestamp("2026-03-01T10:00:01.500Z").unwrap(),
            response: "4".to_string(),
        });
        let mut tags = TagMap::new();
        tags.insert("model".to_string(), TagValue::from("test"));
        Item::new(
            sample_timestamp(),
            tags,
            ItemPayload::Prompt {
                prompt: "2+2?".to_string(),
                completion,
            },
        )
    }

    #[test]
    fn test_kind_wire_tags() {
        assert_eq!(ItemKind::Prompt.as_str(), "prompt");
        assert_eq!(ItemKind::from_wire("event"), Some(ItemKind::Event));
        assert_eq!(ItemKind::from_wire("metric"), None);
    }

    #[test]
    fn test_kind_checked_accessors() {
        let item = prompt_item(false);
        assert_eq!(item.prompt().unwrap(), "2+2?");
        assert!(item.completion().unwrap().is_none());

        let err = item.event_payload().unwrap_err();
        assert!(matches!(err, LogError::WrongKind(_)));
        let err = item.query_record().unwrap_err();
        assert!(matches!(err, LogError::WrongKind(_)));
    }

    #[test]
    fn test_completion_accessor() {
        let item = prompt_item(true);
        let completion = item.completion().unwrap().unwrap();
        assert_eq!(completion.response, "4");
        assert!(completion.completed_at > item.timestamp());
    }

    #[test]
    fn test_render_text_is_stable() {
        let item = prompt_item(true);
        let first = item.render_text();
        let second = item.render_text();
        assert_eq!(first, second);
        assert!(first.contains("timestamp = 2026-03-01T10:00:00.000Z"));
        assert!(first.contains("kind = prompt"));
        assert!(first.contains("prompt = \"2+2?\""));
        assert!(first.contains("  response = \"4\""));
    }

    #[test]
    fn test_render_pending_prompt() {
        let item = prompt_item(false);
        assert!(item.render_text().contains("completion = (pending)"));
    }

    #[test]
    fn test_render_event_payload() {
        let mut payload = Map::new();
        payload.insert("code".to_string(), serde_json::json!(500));
        let item = Item::new(sample_timestamp(), TagMap::new(), ItemPayload::Event { payload });
        let text = item.render_text();
        assert!(text.contains("tags = (none)"));
        assert!(text.contains("  code = 500"));
    }

    #[test]
    fn test_timestamp_format_roundtrip() {
        let ts = sample_timestamp();
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let err = parse_timestamp("not-a-time").unwrap_err();
        assert!(matches!(err, LogError::MalformedDocument(_)));
    }
}
