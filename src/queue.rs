//! Retry queue for unresolved identifiers.
//!
//! FIFO with an O(1) membership test: insertion order is processing order,
//! one entry per identifier. Bounded so intake running far ahead of drain
//! throughput cannot grow memory without limit.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pending identifier awaiting resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// The network BSSID in canonical form.
    pub bssid: String,
    /// Display name (ESSID) observed alongside the BSSID.
    pub ssid: String,
    /// Transient failures accumulated so far. Monotonically non-decreasing
    /// until the item leaves the queue.
    pub retry_count: u32,
    /// When the item first entered the queue.
    pub enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    /// A fresh item with no retries.
    pub fn new(
        bssid: impl Into<String>,
        ssid: impl Into<String>,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bssid: bssid.into(),
            ssid: ssid.into(),
            retry_count: 0,
            enqueued_at,
        }
    }
}

/// Bounded FIFO of pending identifiers, unique by BSSID.
pub struct RetryQueue {
    items: VecDeque<QueueItem>,
    members: HashSet<String>,
    max_entries: usize,
}

impl RetryQueue {
    /// Creates an empty queue.
    pub fn new(max_entries: usize) -> Self {
        Self {
            items: VecDeque::new(),
            members: HashSet::new(),
            max_entries,
        }
    }

    /// Rebuilds a queue from persisted items, preserving order.
    ///
    /// Duplicates and overflow (possible if the file was written by a run
    /// with a larger cap) are discarded.
    pub fn from_items(items: Vec<QueueItem>, max_entries: usize) -> Self {
        let mut queue = Self::new(max_entries);
        for item in items {
            queue.push(item);
        }
        queue
    }

    fn push(&mut self, item: QueueItem) -> bool {
        if self.members.contains(&item.bssid) {
            return false;
        }
        if self.items.len() >= self.max_entries {
            log::warn!(
                "pending queue full ({} items); dropping {}",
                self.max_entries,
                item.bssid
            );
            return false;
        }
        self.members.insert(item.bssid.clone());
        self.items.push_back(item);
        true
    }

    /// Appends an item unless its identifier is already queued.
    ///
    /// Returns `true` if the item was added.
    pub fn enqueue(&mut self, item: QueueItem) -> bool {
        self.push(item)
    }

    /// Whether the identifier is currently queued.
    pub fn contains(&self, bssid: &str) -> bool {
        self.members.contains(bssid)
    }

    /// Removes the identifier from the queue. Returns `true` if present.
    pub fn remove(&mut self, bssid: &str) -> bool {
        if !self.members.remove(bssid) {
            return false;
        }
        self.items.retain(|item| item.bssid != bssid);
        true
    }

    /// Bumps the retry count for a queued identifier.
    ///
    /// Returns the new count, or `None` if the item has since left the queue
    /// (an administrative flush can race a drain pass).
    pub fn increment_retry(&mut self, bssid: &str) -> Option<u32> {
        let item = self.items.iter_mut().find(|item| item.bssid == bssid)?;
        item.retry_count = item.retry_count.saturating_add(1);
        Some(item.retry_count)
    }

    /// Clones up to `n` items from the front, oldest first.
    ///
    /// Items are left in place; a drain pass removes them only once their
    /// outcome is known, so a crash mid-batch never loses work.
    pub fn peek_batch(&self, n: usize) -> Vec<QueueItem> {
        self.items.iter().take(n).cloned().collect()
    }

    /// Number of pending items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes everything. Returns how many items were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        self.members.clear();
        removed
    }

    /// Everything currently queued, in order, for persistence.
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.iter().cloned().collect()
    }
}
