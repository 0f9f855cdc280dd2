// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the TRAPD agent.
//!
//! Provides a WAL-mode, crash-safe event queue with leased-batch delivery
//! semantics. All writes are serialized through `tokio-rusqlite`'s single
//! background thread, so queue operations appear atomic to concurrent
//! callers within the process. Exactly one process may own the queue file.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queue;

pub use database::Database;
pub use models::{QueueItem, QueueStatus};
pub use queue::EventQueue;

pub use trapd_core::{LeasedItem, QueueStats};
