// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the queue table.
//!
//! [`LeasedItem`](trapd_core::LeasedItem), the projection handed across
//! crate boundaries, lives in `trapd-core`; the full row shape and the
//! status encoding are storage-internal concerns defined here.

/// Lifecycle state of a queue item, stored as an integer column.
///
/// `Sent` and `Dead` are terminal; nothing transitions out of them except
/// deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum QueueStatus {
    Pending = 0,
    Leased = 1,
    Sent = 2,
    Dead = 3,
}

impl QueueStatus {
    /// The column value for this status.
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    /// Decode a column value; unknown values indicate a corrupt row.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(QueueStatus::Pending),
            1 => Some(QueueStatus::Leased),
            2 => Some(QueueStatus::Sent),
            3 => Some(QueueStatus::Dead),
            _ => None,
        }
    }
}

/// A full queue row, as persisted.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: i64,
    /// RFC 3339 UTC enqueue timestamp.
    pub created_utc: String,
    /// Event kind; opaque to the queue.
    pub kind: String,
    /// JSON payload; opaque to the queue, never parsed here.
    pub payload_json: String,
    pub status: QueueStatus,
    /// Present iff `status == Leased`.
    pub lease_until_utc: Option<String>,
    pub retry_count: i64,
    /// Reserved for future diagnostics; never written today.
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_i64() {
        for status in [
            QueueStatus::Pending,
            QueueStatus::Leased,
            QueueStatus::Sent,
            QueueStatus::Dead,
        ] {
            assert_eq!(QueueStatus::from_i64(status.as_i64()), Some(status));
        }
    }

    #[test]
    fn unknown_status_values_are_rejected() {
        assert_eq!(QueueStatus::from_i64(4), None);
        assert_eq!(QueueStatus::from_i64(-1), None);
    }

    #[test]
    fn discriminants_match_the_storage_encoding() {
        assert_eq!(QueueStatus::Pending.as_i64(), 0);
        assert_eq!(QueueStatus::Leased.as_i64(), 1);
        assert_eq!(QueueStatus::Sent.as_i64(), 2);
        assert_eq!(QueueStatus::Dead.as_i64(), 3);
    }
}
