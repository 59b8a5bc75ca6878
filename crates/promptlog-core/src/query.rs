//! Index-based lazy query algebra over a buffer.
//!
//! A query is a sorted set of buffer indices plus a description of how the
//! set was derived. Transforms scan only the parent's index set, never the
//! whole buffer, so chained queries cost O(result size) per step. Because
//! buffers are append-only, an index set taken now stays valid no matter
//! how much the buffer grows afterwards.

use crate::buffer::Buffer;
use crate::error::{LogError, LogResult};
use crate::item::Item;
use crate::tags::{FilterMode, TagFilter, TagMap};

/// Immutable view over a buffer: matching indices plus provenance.
///
/// Every transform returns a new query; nothing here mutates the parent or
/// the buffer, except [`record`](Query::record), which appends one QUERY
/// item to the owning buffer.
#[derive(Clone)]
pub struct Query {
    buffer: Buffer,
    indices: Vec<usize>,
    description: String,
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("indices", &self.indices)
            .field("description", &self.description)
            .finish()
    }
}

impl Query {
    pub(crate) fn root(buffer: Buffer, indices: Vec<usize>) -> Self {
        Self {
            buffer,
            indices,
            description: "all".to_string(),
        }
    }

    fn derive(&self, indices: Vec<usize>, op: &str, args: &str) -> Query {
        Query {
            buffer: self.buffer.clone(),
            indices,
            description: format!("{}[{}]({})", op, args, self.description),
        }
    }

    /// Keep the indices whose items satisfy `filter` under `mode`.
    pub fn filter(&self, filter: &TagFilter, mode: FilterMode) -> Query {
        let indices = self.buffer.with_items(|items| {
            self.indices
                .iter()
                .copied()
                .filter(|&i| {
                    items
                        .get(i)
                        .map_or(false, |item| filter.matches(item.tags(), mode))
                })
                .collect()
        });
        self.derive(indices, "filter", &format!("{}: {}", mode, filter.describe()))
    }

    /// Keep the indices whose items satisfy an arbitrary predicate.
    pub fn select<P>(&self, mut predicate: P) -> Query
    where
        P: FnMut(&Item) -> bool,
    {
        let indices = self.buffer.with_items(|items| {
            self.indices
                .iter()
                .copied()
                .filter(|&i| items.get(i).map_or(false, &mut predicate))
                .collect()
        });
        self.derive(indices, "select", "fn")
    }

    /// The first `n` results. Oversized `n` keeps everything; zero keeps
    /// nothing.
    pub fn first(&self, n: usize) -> Query {
        let take = n.min(self.indices.len());
        self.derive(self.indices[..take].to_vec(), "first", &n.to_string())
    }

    /// The last `n` results, in the same ascending order.
    pub fn last(&self, n: usize) -> Query {
        let skip = self.indices.len().saturating_sub(n);
        self.derive(self.indices[skip..].to_vec(), "last", &n.to_string())
    }

    /// Sorted, duplicate-free merge of both result sets.
    pub fn union(&self, other: &Query) -> LogResult<Query> {
        self.check_same_buffer(other, "union")?;
        let mut merged = Vec::with_capacity(self.indices.len() + other.indices.len());
        let (mut a, mut b) = (0, 0);
        while a < self.indices.len() && b < other.indices.len() {
            let (x, y) = (self.indices[a], other.indices[b]);
            if x < y {
                merged.push(x);
                a += 1;
            } else if y < x {
                merged.push(y);
                b += 1;
            } else {
                merged.push(x);
                a += 1;
                b += 1;
            }
        }
        merged.extend_from_slice(&self.indices[a..]);
        merged.extend_from_slice(&other.indices[b..]);
        Ok(Query {
            buffer: self.buffer.clone(),
            indices: merged,
            description: format!("union[{}]({})", other.description, self.description),
        })
    }

    /// Sorted set of indices present in both result sets.
    pub fn intersection(&self, other: &Query) -> LogResult<Query> {
        self.check_same_buffer(other, "intersection")?;
        let mut common = Vec::new();
        let (mut a, mut b) = (0, 0);
        while a < self.indices.len() && b < other.indices.len() {
            let (x, y) = (self.indices[a], other.indices[b]);
            if x < y {
                a += 1;
            } else if y < x {
                b += 1;
            } else {
                common.push(x);
                a += 1;
                b += 1;
            }
        }
        Ok(Query {
            buffer: self.buffer.clone(),
            indices: common,
            description: format!("intersection[{}]({})", other.description, self.description),
        })
    }

    /// Record this query as a QUERY item in the owning buffer, capturing
    /// the description and a snapshot of the matched indices.
    pub fn record(&self, tags: TagMap) {
        self.buffer
            .record_query(self.description.clone(), self.indices.clone(), tags);
    }

    /// Number of matching items.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The item at `position` within this result set (not a buffer index).
    pub fn get(&self, position: usize) -> LogResult<Item> {
        let index = *self
            .indices
            .get(position)
            .ok_or(LogError::IndexOutOfRange {
                index: position,
                len: self.indices.len(),
            })?;
        self.buffer.item_at(index)
    }

    /// Snapshot of the matching items, in ascending buffer order.
    ///
    /// Iterating the same query twice yields identical results.
    pub fn items(&self) -> Vec<Item> {
        self.buffer.with_items(|items| {
            self.indices
                .iter()
                .filter_map(|&i| items.get(i).cloned())
                .collect()
        })
    }

    /// The matched buffer indices, always strictly increasing.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Human-readable trace of how this result set was derived.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The buffer this query draws from.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    fn check_same_buffer(&self, other: &Query, op: &str) -> LogResult<()> {
        if !self.buffer.same_store(&other.buffer) {
            return Err(LogError::CrossBuffer(format!(
                "{} over queries from different buffers",
                op
            )));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items().into_iter()
    }
}
