// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stable per-host sensor identity.
//!
//! Resolved once at startup and never re-read. The id survives in
//! `device_id.txt` inside the data directory; when that file cannot be
//! written the agent still runs with a memory-only id for this process
//! lifetime rather than refusing to start.

use std::fs;
use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

/// Environment variable overriding the persisted id.
const SENSOR_ID_ENV: &str = "SENSOR_ID_OVERRIDE";

/// A resolved sensor identity and where it came from.
#[derive(Debug, Clone)]
pub struct SensorId {
    /// 32 lowercase hex characters, no hyphens.
    pub id: String,
    pub source: SensorIdSource,
}

/// Provenance of the sensor id, reported in logs and `status` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorIdSource {
    /// `SENSOR_ID_OVERRIDE` environment variable.
    Env,
    /// Read back from `device_id.txt`.
    DeviceIdFile,
    /// The file existed but could not be read; a fresh id was generated.
    GeneratedFallback,
    /// Generated and successfully persisted to `device_id.txt`.
    GeneratedNew,
    /// Generated but persisting failed; valid for this process only.
    GeneratedMemoryOnly,
}

impl SensorIdSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorIdSource::Env => "env",
            SensorIdSource::DeviceIdFile => "device_id_file",
            SensorIdSource::GeneratedFallback => "generated_fallback",
            SensorIdSource::GeneratedNew => "generated_new",
            SensorIdSource::GeneratedMemoryOnly => "generated_memory_only",
        }
    }
}

/// Resolve the sensor id against `device_id_file`.
///
/// Resolution order: environment override, persisted file, freshly
/// generated (persisted when possible). Never fails; the worst case is a
/// memory-only id.
pub fn resolve_sensor_id(device_id_file: &Path) -> SensorId {
    if let Ok(id) = std::env::var(SENSOR_ID_ENV) {
        let id = id.trim().to_string();
        if !id.is_empty() {
            info!(source = "env", "sensor id resolved from override");
            return SensorId {
                id,
                source: SensorIdSource::Env,
            };
        }
    }

    if device_id_file.exists() {
        match fs::read_to_string(device_id_file) {
            Ok(contents) => {
                let id = contents.trim().to_string();
                if !id.is_empty() {
                    info!(source = "device_id_file", "sensor id resolved");
                    return SensorId {
                        id,
                        source: SensorIdSource::DeviceIdFile,
                    };
                }
                // Empty file: fall through and regenerate below.
            }
            Err(e) => {
                warn!(error = %e, "device id file unreadable, generating fresh id");
                return SensorId {
                    id: generate_id(),
                    source: SensorIdSource::GeneratedFallback,
                };
            }
        }
    }

    let id = generate_id();
    match fs::write(device_id_file, format!("{id}\n")) {
        Ok(()) => {
            info!(source = "generated_new", "sensor id generated and persisted");
            SensorId {
                id,
                source: SensorIdSource::GeneratedNew,
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot persist device id, using memory-only id");
            SensorId {
                id,
                source: SensorIdSource::GeneratedMemoryOnly,
            }
        }
    }
}

/// A fresh 32-hex-character id without hyphens.
fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
