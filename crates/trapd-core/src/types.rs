// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue values that cross crate boundaries.
//!
//! The storage crate produces these and the transport client consumes them;
//! defining them here keeps the two crates independent of each other. The
//! full row type (with status and lease columns) stays private to storage.

use serde::{Deserialize, Serialize};

/// A queue item claimed by a lease, as handed to the transport client.
///
/// `payload_json` is an opaque, already-serialized JSON document; the queue
/// never parses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeasedItem {
    /// Store-assigned id, strictly increasing in insertion order.
    pub id: i64,
    /// RFC 3339 UTC enqueue timestamp.
    pub created_utc: String,
    /// Event kind, e.g. `"heartbeat"`.
    pub kind: String,
    /// Serialized JSON payload.
    pub payload_json: String,
    /// Times this item has been reclaimed or released since enqueue.
    pub retry_count: i64,
}

/// Per-status row counts, as returned by the queue's `stats()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: u64,
    pub leased: u64,
    pub sent: u64,
    pub dead: u64,
    pub total: u64,
}

impl QueueStats {
    /// True when no rows remain in any status.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
