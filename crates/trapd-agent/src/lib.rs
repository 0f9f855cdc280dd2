// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The TRAPD agent's periodic machinery.
//!
//! The [`Worker`] drives one collect -> enqueue -> drain cycle per tick at
//! a jittered cadence; the [`BatchSender`] executes drain cycles against
//! the durable queue with exponential backoff on consecutive failures.
//! Sensor identity resolution and the host inventory collector live here
//! as well.

pub mod collector;
pub mod envelope;
pub mod identity;
pub mod sender;
pub mod shutdown;
pub mod worker;

pub use collector::{InventoryCollector, InventorySnapshot, SystemCollector};
pub use envelope::HeartbeatEnvelope;
pub use identity::{resolve_sensor_id, SensorId, SensorIdSource};
pub use sender::{BatchSender, DrainOutcome};
pub use worker::Worker;
