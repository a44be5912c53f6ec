// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Capacity-bounded FIFO store of log entries.
//!
//! # Memory Management
//!
//! The buffer never holds more than [`MAX_BUFFERED_ENTRIES`] entries. When it
//! is full, appending evicts the oldest entry first, trading historical
//! completeness for bounded memory.
//!
//! # Sequence Numbers
//!
//! Every stored entry carries an internal, strictly increasing sequence
//! number. A [`Snapshot`] remembers the highest one it contains so that a
//! successful export removes exactly the exported prefix, even when new
//! entries were appended (or old ones evicted) while the export was in flight.

use std::collections::VecDeque;

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::constants::{MAX_BUFFERED_ENTRIES, RESTORED_ENTRIES};
use crate::entry::LogEntry;

#[derive(Debug, Clone)]
struct StoredEntry {
    seq: u64,
    entry: LogEntry,
}

/// Ordered, capacity-bounded sequence of entries.
///
/// # Example
///
/// ```rust
/// use frontend_logs::buffer::RingBuffer;
///
/// let buffer = RingBuffer::new(3, 2);
/// assert!(buffer.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer {
    entries: VecDeque<StoredEntry>,
    /// Hard capacity; typically [`MAX_BUFFERED_ENTRIES`] (1,000).
    max_entries: usize,
    /// Entries kept by [`RingBuffer::restore`]; typically [`RESTORED_ENTRIES`] (500).
    restored_entries: usize,
    next_seq: u64,
}

impl Default for RingBuffer {
    fn default() -> Self {
        RingBuffer::new(MAX_BUFFERED_ENTRIES, RESTORED_ENTRIES)
    }
}

impl RingBuffer {
    /// Creates a buffer with custom limits.
    ///
    /// Prefer [`RingBuffer::default()`] outside of tests.
    #[must_use]
    pub fn new(max_entries: usize, restored_entries: usize) -> Self {
        RingBuffer {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
            restored_entries,
            next_seq: 0,
        }
    }

    /// Appends an entry, evicting the oldest ones to stay within capacity.
    ///
    /// Never fails. Returns the number of evicted entries.
    pub fn append(&mut self, entry: LogEntry) -> usize {
        let mut evicted = 0;
        while self.entries.len() >= self.max_entries && self.entries.pop_front().is_some() {
            evicted += 1;
        }
        if evicted > 0 {
            debug!(
                "LOGS | Buffer full ({} entries), dropped {} oldest entries",
                self.max_entries, evicted
            );
        }
        if self.max_entries > 0 {
            self.push(entry);
        }
        evicted
    }

    /// Replaces the content with a persisted sequence.
    ///
    /// Input that is not an array of well-formed entries is discarded and the
    /// buffer starts empty. Otherwise only the most recent `restored_entries`
    /// are kept, in their original order. Returns the number of restored entries.
    pub fn restore(&mut self, persisted: Value) -> usize {
        self.entries.clear();

        let restored: Vec<LogEntry> = match serde_json::from_value(persisted) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("LOGS | Discarding malformed persisted logs: {}", e);
                return 0;
            }
        };

        let skip = restored.len().saturating_sub(self.restored_entries);
        for entry in restored.into_iter().skip(skip) {
            self.push(entry);
        }
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copies the current content without touching the live state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entries: self.entries.iter().map(|s| s.entry.clone()).collect(),
            through: self.entries.back().map(|s| s.seq),
        }
    }

    /// Removes the entries covered by `snapshot`, keeping anything appended after it.
    ///
    /// Returns the number of removed entries.
    pub fn clear_through(&mut self, snapshot: &Snapshot) -> usize {
        let Some(through) = snapshot.through else {
            return 0;
        };
        let mut removed = 0;
        while self
            .entries
            .front()
            .is_some_and(|stored| stored.seq <= through)
        {
            self.entries.pop_front();
            removed += 1;
        }
        removed
    }

    /// Iterates over the entries, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter().map(|stored| &stored.entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: LogEntry) {
        self.entries.push_back(StoredEntry {
            seq: self.next_seq,
            entry,
        });
        self.next_seq += 1;
    }
}

/// Immutable copy of the buffer at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: Vec<LogEntry>,
    through: Option<u64>,
}

impl Snapshot {
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A snapshot serializes as the plain array of its entries.
impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.entries.serialize(serializer)
    }
}
