//! Named, append-only buffers and the prompt call handle.
//!
//! A [`Buffer`] is the sole owner of the items recorded into it. It only
//! ever grows: no method removes or reorders items, so an item's index is
//! stable for the buffer's lifetime and outstanding queries stay valid as
//! the buffer grows.
//!
//! `Buffer` is a cheap handle over shared storage (clones record into the
//! same item list), so a producer thread can keep recording while an earlier
//! call site completes its prompt through a [`CallHandle`].

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{LogError, LogResult};
use crate::item::{Completion, Item, ItemPayload};
use crate::query::Query;
use crate::tags::{FilterMode, TagFilter, TagMap};

pub(crate) struct BufferInner {
    name: Option<String>,
    clock: Arc<dyn Clock>,
    items: RwLock<Vec<Item>>,
}

impl BufferInner {
    /// Guarded completion transition for the prompt at `index`.
    ///
    /// The write lock makes concurrent completions mutually exclusive: of
    /// two racing calls on the same handle, exactly one wins and the other
    /// observes `AlreadyCompleted`.
    fn complete(&self, index: usize, response: String) -> LogResult<()> {
        let completed_at = self.clock.now();
        let mut items = self.items.write();
        let len = items.len();
        let item = items
            .get_mut(index)
            .ok_or(LogError::IndexOutOfRange { index, len })?;
        let kind = item.kind();
        match &mut item.payload {
            ItemPayload::Prompt { completion, .. } => {
                if completion.is_some() {
                    return Err(LogError::AlreadyCompleted(index));
                }
                *completion = Some(Completion {
                    completed_at,
                    response,
                });
                Ok(())
            }
            _ => Err(LogError::WrongKind(format!(
                "completion for {} item at index {}",
                kind, index
            ))),
        }
    }
}

/// Named, growable, append-only ordered collection of log items.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<BufferInner>,
}

impl Buffer {
    /// Create the unnamed default-style buffer with the system clock.
    pub fn new() -> Self {
        Self::with_clock(None, Arc::new(SystemClock))
    }

    /// Create a named buffer with the system clock.
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_clock(Some(name.into()), Arc::new(SystemClock))
    }

    /// Create a buffer with an explicit clock, so tests drive time manually.
    pub fn with_clock(name: Option<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(BufferInner {
                name,
                clock,
                items: RwLock::new(Vec::new()),
            }),
        }
    }

    /// The buffer's name; `None` for the default buffer.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Number of items recorded so far.
    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.read().is_empty()
    }

    /// Append an EVENT item with the given payload and tags.
    ///
    /// The payload is opaque to the core; it is stored and returned
    /// verbatim. Tag values are typed, so there is nothing left to fail.
    pub fn record_event(&self, payload: Map<String, Value>, tags: TagMap) {
        let item = Item::new(self.inner.clock.now(), tags, ItemPayload::Event { payload });
        let mut items = self.inner.items.write();
        items.push(item);
        debug!(buffer = self.display_name(), index = items.len() - 1, "Recorded event");
    }

    /// Append a PROMPT item with no completion and return the handle used
    /// to attach the response later, possibly from another call site.
    pub fn record_prompt_start(&self, prompt: impl Into<String>, tags: TagMap) -> CallHandle {
        let item = Item::new(
            self.inner.clock.now(),
            tags,
            ItemPayload::Prompt {
                prompt: prompt.into(),
                completion: None,
            },
        );
        let mut items = self.inner.items.write();
        items.push(item);
        let index = items.len() - 1;
        debug!(buffer = self.display_name(), index, "Recorded prompt start");
        CallHandle {
            buffer: Arc::downgrade(&self.inner),
            index,
        }
    }

    /// Attach a completion to the prompt at `index`.
    ///
    /// Normally reached through [`CallHandle::complete`]; the index and
    /// kind checks exist for direct misuse.
    pub fn record_prompt_completion(
        &self,
        index: usize,
        response: impl Into<String>,
    ) -> LogResult<()> {
        self.inner.complete(index, response.into())
    }

    /// Item at `index` (a clone; items are immutable values).
    pub fn item_at(&self, index: usize) -> LogResult<Item> {
        let items = self.inner.items.read();
        items.get(index).cloned().ok_or(LogError::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }

    /// Snapshot of all items in append order.
    pub fn items(&self) -> Vec<Item> {
        self.inner.items.read().clone()
    }

    /// Match-everything root query over the current buffer contents.
    pub fn all(&self) -> Query {
        let indices: Vec<usize> = (0..self.len()).collect();
        Query::root(self.clone(), indices)
    }

    /// Filter the whole buffer by tags.
    pub fn filter(&self, filter: &TagFilter, mode: FilterMode) -> Query {
        self.all().filter(filter, mode)
    }

    /// The first `n` items of the buffer, as a query.
    pub fn first(&self, n: usize) -> Query {
        self.all().first(n)
    }

    /// The last `n` items of the buffer, as a query.
    pub fn last(&self, n: usize) -> Query {
        self.all().last(n)
    }

    /// Filter the whole buffer with an arbitrary predicate.
    pub fn select<P>(&self, predicate: P) -> Query
    where
        P: FnMut(&Item) -> bool,
    {
        self.all().select(predicate)
    }

    /// Append a QUERY item capturing a recorded query's provenance.
    pub(crate) fn record_query(
        &self,
        op_name: String,
        matched_indices: Vec<usize>,
        tags: TagMap,
    ) {
        let item = Item::new(
            self.inner.clock.now(),
            tags,
            ItemPayload::Query {
                op_name,
                matched_indices,
            },
        );
        let mut items = self.inner.items.write();
        items.push(item);
        debug!(buffer = self.display_name(), index = items.len() - 1, "Recorded query");
    }

    /// Append a fully formed item, preserving its recorded timestamps.
    /// Replay path for document loading.
    pub(crate) fn append_item(&self, item: Item) {
        self.inner.items.write().push(item);
    }

    /// Run `f` against the item slice under a single read guard.
    pub(crate) fn with_items<R>(&self, f: impl FnOnce(&[Item]) -> R) -> R {
        let items = self.inner.items.read();
        f(&items)
    }

    /// Whether `other` is a handle to the same underlying storage.
    pub(crate) fn same_store(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn display_name(&self) -> &str {
        self.inner.name.as_deref().unwrap_or("(default)")
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Buffer {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    /// Iterate a snapshot of the items in append order.
    fn into_iter(self) -> Self::IntoIter {
        self.items().into_iter()
    }
}

/// Capability returned by [`Buffer::record_prompt_start`].
///
/// Holds a non-owning reference back to the buffer plus the index of the
/// prompt item it finishes. Completing a second time fails with
/// `AlreadyCompleted`. A handle that is never completed leaves its item
/// permanently incomplete, which is a valid terminal state.
#[derive(Clone)]
pub struct CallHandle {
    buffer: Weak<BufferInner>,
    index: usize,
}

impl CallHandle {
    /// Index of the prompt item this handle finishes.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Attach the response to the prompt this handle started.
    pub fn complete(&self, response: impl Into<String>) -> LogResult<()> {
        let inner = self.buffer.upgrade().ok_or_else(|| {
            LogError::BufferDiscarded("prompt completion after buffer was dropped".to_string())
        })?;
        inner.complete(self.index, response.into())
    }
}
