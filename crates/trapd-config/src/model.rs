// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the TRAPD agent.
//!
//! All fields are optional in `config.json`; out-of-range numeric values
//! are clamped to defaults with a warning rather than rejected. The one
//! hard requirement is `project_id`, which must arrive from the file or
//! the `PROJECT_ID_OVERRIDE` environment variable.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use trapd_core::AgentError;

/// Tick cadence bounds and default, in seconds.
pub const INTERVAL_RANGE: (u64, u64) = (10, 3600);
pub const DEFAULT_INTERVAL_S: u64 = 60;

/// Batch size bounds and default.
pub const BATCH_SIZE_RANGE: (usize, usize) = (1, 1000);
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default intake base URL.
pub const DEFAULT_API_URL: &str = "https://api.trapd.io";

/// Agent configuration, immutable after [`validated`](AgentConfig::validated).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Base URL of the intake.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Project identifier sent in every event. Required; absence from every
    /// source is fatal at startup.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Tick cadence in seconds, clamped to [10, 3600].
    #[serde(default = "default_interval_s")]
    pub interval_s: u64,

    /// Maximum items per lease, clamped to [1, 1000].
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Logging level.
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            project_id: None,
            interval_s: default_interval_s(),
            batch_size: default_batch_size(),
            log_level: LogLevel::default(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_interval_s() -> u64 {
    DEFAULT_INTERVAL_S
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl AgentConfig {
    /// Clamp out-of-range numeric options back to their defaults, warning
    /// for each, and verify `project_id` is present.
    pub fn validated(mut self) -> Result<Self, AgentError> {
        let (lo, hi) = INTERVAL_RANGE;
        if self.interval_s < lo || self.interval_s > hi {
            warn!(
                interval_s = self.interval_s,
                default = DEFAULT_INTERVAL_S,
                "interval_s outside [{lo}, {hi}], using default"
            );
            self.interval_s = DEFAULT_INTERVAL_S;
        }

        let (lo, hi) = BATCH_SIZE_RANGE;
        if self.batch_size < lo || self.batch_size > hi {
            warn!(
                batch_size = self.batch_size,
                default = DEFAULT_BATCH_SIZE,
                "batch_size outside [{lo}, {hi}], using default"
            );
            self.batch_size = DEFAULT_BATCH_SIZE;
        }

        match &self.project_id {
            Some(id) if !id.trim().is_empty() => Ok(self),
            _ => Err(AgentError::Config(
                "project_id is not set; provide it in config.json or PROJECT_ID_OVERRIDE".into(),
            )),
        }
    }

    /// Tick cadence as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_s)
    }

    /// The validated project id.
    ///
    /// Only meaningful after [`validated`](Self::validated); defaults to the
    /// empty string before.
    pub fn project_id(&self) -> &str {
        self.project_id.as_deref().unwrap_or_default()
    }
}

/// Logging verbosity, matching the names the intake product uses across
/// platforms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum LogLevel {
    #[serde(alias = "trace")]
    Trace,
    #[serde(alias = "debug")]
    Debug,
    #[default]
    #[serde(alias = "information", alias = "info", alias = "Info")]
    Information,
    #[serde(alias = "warning", alias = "warn", alias = "Warn")]
    Warning,
    #[serde(alias = "error")]
    Error,
    #[serde(alias = "critical")]
    Critical,
}

impl LogLevel {
    /// Directive fragment for a `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Information => "info",
            LogLevel::Warning => "warn",
            // tracing has no level above error; both map to the same floor.
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}
