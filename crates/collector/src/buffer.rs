//! Concurrent store of pending records, keyed by (exchange, symbol).

use dashmap::DashMap;

use crate::record::{BufferKey, TradeRecord};

/// Records buffered per key before a flush is forced.
pub const DEFAULT_BUFFER_THRESHOLD: usize = 500;

/// Concurrency-safe map from [`BufferKey`] to its ordered pending records.
///
/// Appends and drains for one key serialize on the map's per-shard lock,
/// so a record lands in exactly one drain result, in arrival order. This
/// is the only state shared between feed tasks.
pub struct BufferStore {
    buffers: DashMap<BufferKey, Vec<TradeRecord>>,
    threshold: usize,
}

impl BufferStore {
    pub fn new(threshold: usize) -> Self {
        Self {
            buffers: DashMap::new(),
            threshold,
        }
    }

    /// Append one record in arrival order. Returns true when the key's
    /// buffer has reached the flush threshold and should be drained now.
    pub fn append(&self, key: BufferKey, record: TradeRecord) -> bool {
        let mut buffer = self.buffers.entry(key).or_default();
        buffer.push(record);
        buffer.len() >= self.threshold
    }

    /// Atomically take every pending record for `key`, oldest first,
    /// leaving an empty buffer behind. Empty vec when the key is unknown.
    pub fn drain(&self, key: &BufferKey) -> Vec<TradeRecord> {
        self.buffers
            .get_mut(key)
            .map(|mut buffer| std::mem::take(buffer.value_mut()))
            .unwrap_or_default()
    }

    /// Every key that has ever buffered a record. Drained keys stay
    /// listed so the periodic flush keeps visiting them.
    pub fn keys(&self) -> Vec<BufferKey> {
        self.buffers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Currently buffered record count for `key`.
    pub fn pending(&self, key: &BufferKey) -> usize {
        self.buffers.get(key).map(|buffer| buffer.len()).unwrap_or(0)
    }
}
