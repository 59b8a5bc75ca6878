//! Tag values and filter arguments.
//!
//! Tags are string-keyed, typed labels attached to every log item. The value
//! set is closed: strings, booleans, integers, floats, and nested maps of
//! the same. Anything else (JSON null, arrays) is rejected at the boundary
//! with [`LogError::InvalidTag`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LogError, LogResult};

/// A single tag value.
///
/// Serializes untagged, so a tag value appears on the wire as the bare JSON
/// value (`"error"`, `500`, `true`, `{...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(BTreeMap<String, TagValue>),
}

/// Mapping of tag key to tag value.
///
/// Ordered so rendering and serialization are deterministic.
pub type TagMap = BTreeMap<String, TagValue>;

impl TagValue {
    /// Convert a JSON value into a tag value.
    ///
    /// `null` and arrays are outside the tag value set.
    pub fn from_json(key: &str, value: Value) -> LogResult<Self> {
        match value {
            Value::Bool(b) => Ok(TagValue::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(TagValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(TagValue::Float(f))
                } else {
                    Err(LogError::InvalidTag(format!(
                        "unrepresentable number for key '{}'",
                        key
                    )))
                }
            }
            Value::String(s) => Ok(TagValue::String(s)),
            Value::Object(map) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    let nested = TagValue::from_json(&k, v)?;
                    out.insert(k, nested);
                }
                Ok(TagValue::Map(out))
            }
            Value::Null => Err(LogError::InvalidTag(format!(
                "null is not a valid tag value (key '{}')",
                key
            ))),
            Value::Array(_) => Err(LogError::InvalidTag(format!(
                "arrays are not valid tag values (key '{}')",
                key
            ))),
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(b) => write!(f, "{}", b),
            TagValue::Int(i) => write!(f, "{}", i),
            TagValue::Float(x) => write!(f, "{}", x),
            TagValue::String(s) => write!(f, "{:?}", s),
            TagValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        TagValue::Int(value as i64)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::Float(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::String(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::String(value)
    }
}

impl From<BTreeMap<String, TagValue>> for TagValue {
    fn from(value: BTreeMap<String, TagValue>) -> Self {
        TagValue::Map(value)
    }
}

/// How a tag filter combines its per-key conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// At least one filter key matches the item.
    Any,
    /// Every filter key matches the item.
    All,
    /// No filter key matches the item.
    None,
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterMode::Any => "any",
            FilterMode::All => "all",
            FilterMode::None => "none",
        };
        write!(f, "{}", name)
    }
}

/// Filter argument: tag key to one or more acceptable literal values.
///
/// A key added with [`with`](TagFilter::with) accepts exactly that value;
/// [`with_any`](TagFilter::with_any) accepts any of the listed values. Both
/// forms accumulate into the same per-key list, so `with("k", a)` followed
/// by `with("k", b)` is equivalent to `with_any("k", [a, b])`.
///
/// An empty filter matches every item under `All` and `None` (vacuous truth)
/// and no item under `Any`.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    accept: BTreeMap<String, Vec<TagValue>>,
}

impl TagFilter {
    /// Empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `value` for `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.accept.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Accept any of `values` for `key`.
    pub fn with_any<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<TagValue>,
    {
        let slot = self.accept.entry(key.into()).or_default();
        slot.extend(values.into_iter().map(Into::into));
        self
    }

    /// True if the filter has no keys.
    pub fn is_empty(&self) -> bool {
        self.accept.is_empty()
    }

    /// Whether `tags` satisfies the filter under `mode`.
    ///
    /// A key matches when the item carries it and the value equals one of
    /// the accepted literals; a missing key never matches.
    pub fn matches(&self, tags: &TagMap, mode: FilterMode) -> bool {
        let key_hit =
            |(key, accepted): (&String, &Vec<TagValue>)| match tags.get(key.as_str()) {
                Some(value) => accepted.contains(value),
                None => false,
            };
        match mode {
            FilterMode::Any => self.accept.iter().any(key_hit),
            FilterMode::All => self.accept.iter().all(key_hit),
            FilterMode::None => !self.accept.iter().any(key_hit),
        }
    }

    /// Compact textual form used in query descriptions.
    pub(crate) fn describe(&self) -> String {
        let mut parts = Vec::with_capacity(self.accept.len());
        for (key, accepted) in &self.accept {
            let values: Vec<String> = accepted.iter().map(|v| v.to_string()).collect();
            parts.push(format!("{}={}", key, values.join("|")));
        }
        parts.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, TagValue)]) -> TagMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_from_json_accepts_scalars_and_maps() {
        let v = TagValue::from_json("k", serde_json::json!("error")).unwrap();
        assert_eq!(v, TagValue::String("error".into()));

        let v = TagValue::from_json("k", serde_json::json!(500)).unwrap();
        assert_eq!(v, TagValue::Int(500));

        let v = TagValue::from_json("k", serde_json::json!(0.5)).unwrap();
        assert_eq!(v, TagValue::Float(0.5));

        let v = TagValue::from_json("k", serde_json::json!({"inner": true})).unwrap();
        match v {
            TagValue::Map(map) => assert_eq!(map["inner"], TagValue::Bool(true)),
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_rejects_null_and_arrays() {
        let err = TagValue::from_json("k", serde_json::json!(null)).unwrap_err();
        assert!(matches!(err, LogError::InvalidTag(_)));

        let err = TagValue::from_json("k", serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err, LogError::InvalidTag(_)));

        // Nested offenders are rejected too
        let err = TagValue::from_json("k", serde_json::json!({"inner": null})).unwrap_err();
        assert!(matches!(err, LogError::InvalidTag(_)));
    }

    #[test]
    fn test_untagged_serde_roundtrip() {
        let original = TagValue::Map(tags(&[
            ("flag", TagValue::Bool(true)),
            ("count", TagValue::Int(3)),
            ("label", TagValue::String("x".into())),
        ]));
        let json = serde_json::to_string(&original).unwrap();
        let parsed: TagValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_filter_any_all_none() {
        let item_tags = tags(&[
            ("status", TagValue::String("error".into())),
            ("code", TagValue::Int(500)),
        ]);

        let filter = TagFilter::new()
            .with("status", "error")
            .with("missing", "whatever");

        assert!(filter.matches(&item_tags, FilterMode::Any));
        assert!(!filter.matches(&item_tags, FilterMode::All));
        assert!(!filter.matches(&item_tags, FilterMode::None));

        let filter = TagFilter::new().with("status", "ok");
        assert!(!filter.matches(&item_tags, FilterMode::Any));
        assert!(filter.matches(&item_tags, FilterMode::None));
    }

    #[test]
    fn test_filter_multiple_accepted_values() {
        let item_tags = tags(&[("code", TagValue::Int(404))]);
        let filter = TagFilter::new().with_any("code", [500, 404]);
        assert!(filter.matches(&item_tags, FilterMode::Any));
        assert!(filter.matches(&item_tags, FilterMode::All));
    }

    #[test]
    fn test_missing_key_never_matches() {
        let item_tags = TagMap::new();
        let filter = TagFilter::new().with("status", "error");
        assert!(!filter.matches(&item_tags, FilterMode::Any));
        assert!(!filter.matches(&item_tags, FilterMode::All));
        // "none" is satisfied precisely because nothing matched
        assert!(filter.matches(&item_tags, FilterMode::None));
    }

    #[test]
    fn test_describe_is_deterministic() {
        let filter = TagFilter::new()
            .with_any("code", [500, 404])
            .with("status", "error");
        assert_eq!(filter.describe(), "code=500|404,status=\"error\"");
    }
}
