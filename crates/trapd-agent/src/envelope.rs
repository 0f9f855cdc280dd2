// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The heartbeat envelope: the payload of every periodic event.

use serde::Serialize;

use trapd_core::time;

use crate::collector::{HardwareInfo, HostInfo, IdentityInfo, InventorySnapshot};

/// Payload enqueued once per tick and shipped to the intake.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatEnvelope {
    pub sensor_id: String,
    pub project_id: String,
    /// RFC 3339 UTC instant the envelope was built.
    pub ts: String,
    pub kind: String,
    pub message: String,
    pub host: HostInfo,
    pub agent: AgentMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware: Option<HardwareInfo>,
    pub identity: IdentityInfo,
}

/// Agent self-description inside the envelope.
#[derive(Debug, Clone, Serialize)]
pub struct AgentMeta {
    /// Normalized MAJOR.MINOR.PATCH.
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_restart: Option<String>,
}

impl HeartbeatEnvelope {
    /// Assemble an envelope from a snapshot, stamped with the current time.
    pub fn new(
        sensor_id: &str,
        project_id: &str,
        snapshot: InventorySnapshot,
        agent: AgentMeta,
    ) -> Self {
        let message = format!("heartbeat from {}", snapshot.host.hostname);
        Self {
            sensor_id: sensor_id.to_string(),
            project_id: project_id.to_string(),
            ts: time::utc_now(),
            kind: "heartbeat".to_string(),
            message,
            host: snapshot.host,
            agent,
            hardware: snapshot.hardware,
            identity: snapshot.identity,
        }
    }
}
