//! FIFO Order Module
//!
//! Tracks insertion order for capacity eviction of the local store.

use std::collections::{HashMap, VecDeque};

/// Stale queue slots tolerated beyond the live count before a compaction.
const COMPACT_SLACK: usize = 16;

// == FIFO Order ==
/// Insertion order of live keys.
///
/// Keys are queued with an insertion sequence number where:
/// - Front = oldest insertion (next eviction candidate)
/// - Back = newest insertion
///
/// Removal and reinsertion only update `live`; the queue slot left behind
/// is stale and skipped when it reaches the front. Every operation except
/// `retain` is amortized O(1).
///
/// Reads never reorder keys; only a fresh insertion moves a key to the back.
#[derive(Debug, Default)]
pub struct FifoOrder {
    queue: VecDeque<(String, u64)>,
    /// Current insertion sequence of every live key
    live: HashMap<String, u64>,
    next_seq: u64,
}

impl FifoOrder {
    // == Constructor ==
    /// Creates a new empty order tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Insert ==
    /// Records `key` as the newest insertion, superseding any earlier position.
    pub fn record_insert(&mut self, key: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(key.to_string(), seq);
        self.queue.push_back((key.to_string(), seq));
        self.maybe_compact();
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        if self.live.remove(key).is_some() {
            self.maybe_compact();
        }
    }

    /// Removes every key not matching `pred`.
    pub fn retain(&mut self, mut pred: impl FnMut(&str) -> bool) {
        self.live.retain(|k, _| pred(k));
        self.compact();
    }

    // == Evict Oldest ==
    /// Returns and removes the oldest inserted key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        while let Some((key, seq)) = self.queue.pop_front() {
            if !self.is_stale(&key, seq) {
                self.live.remove(&key);
                return Some(key);
            }
        }
        None
    }

    // == Peek Oldest ==
    /// Returns the oldest inserted key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.queue
            .iter()
            .find(|(key, seq)| !self.is_stale(key, *seq))
            .map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    fn is_stale(&self, key: &str, seq: u64) -> bool {
        self.live.get(key) != Some(&seq)
    }

    fn maybe_compact(&mut self) {
        if self.queue.len() > 2 * self.live.len() + COMPACT_SLACK {
            self.compact();
        }
    }

    fn compact(&mut self) {
        let live = &self.live;
        self.queue.retain(|(key, seq)| live.get(key) == Some(seq));
    }
}
