//! Process-wide named buffer registry.
//!
//! Buffers are resolved by name and created lazily on first access; the
//! same name always yields the same instance for the registry's lifetime.
//! Embedding applications that prefer explicit dependency passing construct
//! their own [`BufferRegistry`]; [`BufferRegistry::global`] covers the
//! common case of one registry per process.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::buffer::Buffer;
use crate::clock::{Clock, SystemClock};

/// Name-to-buffer map with lazy creation.
pub struct BufferRegistry {
    clock: Arc<dyn Clock>,
    buffers: Mutex<HashMap<Option<String>, Buffer>>,
}

impl BufferRegistry {
    /// Registry whose buffers use the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Registry whose buffers share an injected clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            buffers: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a buffer by name, creating it on first access.
    ///
    /// `None` resolves the unnamed default buffer.
    pub fn get(&self, name: Option<&str>) -> Buffer {
        let key = name.map(str::to_owned);
        let mut buffers = self.buffers.lock();
        buffers
            .entry(key.clone())
            .or_insert_with(|| Buffer::with_clock(key, self.clock.clone()))
            .clone()
    }

    /// Names of the buffers created so far, sorted; the unnamed default
    /// buffer is not listed.
    pub fn names(&self) -> Vec<String> {
        let buffers = self.buffers.lock();
        let mut names: Vec<String> = buffers.keys().flatten().cloned().collect();
        names.sort();
        names
    }

    /// The process-wide registry.
    pub fn global() -> &'static BufferRegistry {
        static GLOBAL: OnceLock<BufferRegistry> = OnceLock::new();
        GLOBAL.get_or_init(BufferRegistry::new)
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::new()
    }
}
