// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Duplicate Detection Cache
//!
//! Flood relay re-emits every message to every neighbor, so each node sees
//! the same message id from several directions. This cache answers "have we
//! already processed this id?" in O(1) amortized, bounded both in time
//! (entries expire after [`DEDUP_WINDOW_MS`]) and in space (soft capacity,
//! oldest evicted first).

use std::collections::HashMap;

use crate::message::MessageId;

/// How long a seen message id stays in the cache (300 s).
pub const DEDUP_WINDOW_MS: u64 = 300_000;

/// Soft capacity bound.
pub const DEDUP_CAPACITY: usize = 1_000;

/// Time-expiring set of recently seen message ids.
#[derive(Debug, Clone)]
pub struct DuplicateCache {
    entries: HashMap<MessageId, u64>,
    window_ms: u64,
    capacity: usize,
}

impl Default for DuplicateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateCache {
    /// Creates a cache with the standard window and capacity.
    pub fn new() -> Self {
        Self::with_limits(DEDUP_WINDOW_MS, DEDUP_CAPACITY)
    }

    /// Creates a cache with custom limits (for tests).
    pub fn with_limits(window_ms: u64, capacity: usize) -> Self {
        DuplicateCache {
            entries: HashMap::new(),
            window_ms,
            capacity,
        }
    }

    /// Pure lookup: true if the id is present, regardless of age.
    ///
    /// Expired entries are removed by writes and sweeps, never by reads.
    pub fn is_duplicate(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Records an id as processed at `now_ms`.
    ///
    /// Re-marking a present id refreshes its timestamp without growing the
    /// cache. Every write also sweeps expired entries, and evicts the oldest
    /// entries if the capacity bound is exceeded.
    pub fn mark_processed(&mut self, id: &str, now_ms: u64) {
        self.entries.insert(id.to_string(), now_ms);
        self.prune(now_ms);

        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, &ts)| ts)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    self.entries.remove(&id);
                }
                None => break,
            }
        }
    }

    /// Removes every entry older than the window.
    pub fn prune(&mut self, now_ms: u64) {
        let window = self.window_ms;
        self.entries
            .retain(|_, &mut ts| now_ms.saturating_sub(ts) < window);
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of all entries for persistence across restarts.
    pub fn snapshot(&self) -> Vec<(MessageId, u64)> {
        self.entries
            .iter()
            .map(|(id, &ts)| (id.clone(), ts))
            .collect()
    }

    /// Restores a persisted snapshot, discarding entries already stale at
    /// load time.
    pub fn restore(&mut self, entries: Vec<(MessageId, u64)>, now_ms: u64) {
        for (id, ts) in entries {
            if now_ms.saturating_sub(ts) < self.window_ms {
                self.entries.insert(id, ts);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_id_is_not_duplicate() {
        let cache = DuplicateCache::new();
        assert!(!cache.is_duplicate("m1"));
    }

    #[test]
    fn marked_id_is_duplicate() {
        let mut cache = DuplicateCache::new();
        cache.mark_processed("m1", 1_000);
        assert!(cache.is_duplicate("m1"));
    }

    #[test]
    fn remark_refreshes_without_growth() {
        let mut cache = DuplicateCache::new();
        cache.mark_processed("m1", 1_000);
        cache.mark_processed("m1", 2_000);
        assert_eq!(cache.len(), 1);

        // The refreshed entry survives a sweep that would have expired the
        // original timestamp.
        cache.prune(1_000 + DEDUP_WINDOW_MS);
        assert!(cache.is_duplicate("m1"));
    }

    #[test]
    fn entries_expire_after_window() {
        let mut cache = DuplicateCache::new();
        cache.mark_processed("m1", 0);
        cache.prune(DEDUP_WINDOW_MS - 1);
        assert!(cache.is_duplicate("m1"));
        cache.prune(DEDUP_WINDOW_MS);
        assert!(!cache.is_duplicate("m1"));
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut cache = DuplicateCache::with_limits(DEDUP_WINDOW_MS, 3);
        cache.mark_processed("m1", 10);
        cache.mark_processed("m2", 20);
        cache.mark_processed("m3", 30);
        cache.mark_processed("m4", 40);
        assert_eq!(cache.len(), 3);
        assert!(!cache.is_duplicate("m1"));
        assert!(cache.is_duplicate("m4"));
    }

    #[test]
    fn restore_discards_stale_entries() {
        let mut cache = DuplicateCache::new();
        cache.restore(
            vec![("old".into(), 0), ("fresh".into(), DEDUP_WINDOW_MS)],
            DEDUP_WINDOW_MS + 1,
        );
        assert!(!cache.is_duplicate("old"));
        assert!(cache.is_duplicate("fresh"));
        assert_eq!(cache.len(), 1);
    }
}
