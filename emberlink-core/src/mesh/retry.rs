// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Send Retry Queue
//!
//! Holds the already-serialized envelope of every message whose initial
//! flood reached no neighbor. A periodic tick retries due entries with
//! exponential backoff; after [`MAX_RETRY_ATTEMPTS`] failed retries the
//! message is marked failed and evicted.
//!
//! Retries reuse the original bytes (same message id, same ttl), so peers
//! that already saw a copy suppress it as a duplicate.
//!
//! The queue is memory-only. A process restart loses pending retries; the
//! corresponding history records simply stay `Pending`.

use std::collections::HashMap;

use crate::message::MessageId;

/// Base retry delay (1 s).
pub const RETRY_BASE_MS: u64 = 1_000;

/// Retry attempts before a message is marked failed.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// What to do with an entry after a failed retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryVerdict {
    /// Backoff rescheduled; try again later.
    Again,
    /// Attempts exhausted; mark the message failed and evict.
    Exhausted,
}

/// One queued retry.
#[derive(Debug, Clone)]
pub struct RetryEntry {
    /// Message this retry belongs to.
    pub message_id: MessageId,
    /// The original serialized envelope.
    pub envelope_bytes: Vec<u8>,
    /// Failed retry attempts so far (the initial flood is not counted).
    pub attempts: u32,
    /// Earliest time this entry is due, milliseconds since epoch.
    pub next_attempt_at: u64,
}

/// In-memory retry queue keyed by message id.
#[derive(Debug, Default)]
pub struct RetryQueue {
    entries: HashMap<MessageId, RetryEntry>,
    base_ms: u64,
    max_attempts: u32,
}

impl RetryQueue {
    pub fn new() -> Self {
        Self::with_limits(RETRY_BASE_MS, MAX_RETRY_ATTEMPTS)
    }

    /// Creates a queue with custom backoff parameters (for tests).
    pub fn with_limits(base_ms: u64, max_attempts: u32) -> Self {
        RetryQueue {
            entries: HashMap::new(),
            base_ms,
            max_attempts,
        }
    }

    /// Backoff delay after `attempts` failed retries.
    pub fn backoff_ms(&self, attempts: u32) -> u64 {
        self.base_ms.saturating_mul(1u64 << attempts.min(16))
    }

    /// Queues a message whose initial flood failed entirely.
    ///
    /// The first retry is due one base delay after `now_ms`. Re-enqueueing
    /// an id that is already queued is a no-op.
    pub fn enqueue(&mut self, message_id: &str, envelope_bytes: Vec<u8>, now_ms: u64) {
        self.entries
            .entry(message_id.to_string())
            .or_insert_with(|| RetryEntry {
                message_id: message_id.to_string(),
                envelope_bytes,
                attempts: 0,
                next_attempt_at: now_ms + self.base_ms,
            });
    }

    /// Ids of all entries due at `now_ms`, oldest first.
    pub fn due(&self, now_ms: u64) -> Vec<MessageId> {
        let mut due: Vec<&RetryEntry> = self
            .entries
            .values()
            .filter(|e| e.next_attempt_at <= now_ms)
            .collect();
        due.sort_by_key(|e| e.next_attempt_at);
        due.iter().map(|e| e.message_id.clone()).collect()
    }

    /// The serialized envelope for a queued id.
    pub fn envelope_bytes(&self, message_id: &str) -> Option<&[u8]> {
        self.entries
            .get(message_id)
            .map(|e| e.envelope_bytes.as_slice())
    }

    /// Records a failed retry, rescheduling with exponential backoff or
    /// evicting after the attempt cap.
    pub fn record_failure(&mut self, message_id: &str, now_ms: u64) -> RetryVerdict {
        let max_attempts = self.max_attempts;
        let exhausted = match self.entries.get_mut(message_id) {
            Some(entry) => {
                entry.attempts += 1;
                if entry.attempts >= max_attempts {
                    true
                } else {
                    let backoff = self.base_ms.saturating_mul(1u64 << entry.attempts.min(16));
                    entry.next_attempt_at = now_ms + backoff;
                    false
                }
            }
            None => return RetryVerdict::Exhausted,
        };

        if exhausted {
            self.entries.remove(message_id);
            RetryVerdict::Exhausted
        } else {
            RetryVerdict::Again
        }
    }

    /// Removes an entry after a successful retry.
    pub fn remove(&mut self, message_id: &str) -> bool {
        self.entries.remove(message_id).is_some()
    }

    /// True if the id is queued.
    pub fn contains(&self, message_id: &str) -> bool {
        self.entries.contains_key(message_id)
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
