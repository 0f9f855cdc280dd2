// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types shared across the TRAPD agent crates.
//!
//! Holds the error taxonomy, the queue item values that cross crate
//! boundaries (storage hands them to the transport client), UTC timestamp
//! helpers, and agent version normalization.

pub mod error;
pub mod time;
pub mod types;
pub mod version;

pub use error::AgentError;
pub use types::{LeasedItem, QueueStats};
