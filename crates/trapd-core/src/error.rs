// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the TRAPD agent.

use thiserror::Error;

/// The primary error type used across all agent crates.
///
/// The startup/steady-state policy lives with the callers: `Config` and
/// `Secret` are fatal at startup, `Storage` is fatal on open and logged in
/// steady state, `Transport` is always recovered locally by the sender.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration errors (missing project id, unresolvable data directory).
    #[error("configuration error: {0}")]
    Config(String),

    /// API key missing, unreadable, or empty.
    #[error("secret error: {0}")]
    Secret(String),

    /// Queue store open, migration, or transactional operation failure.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Network, TLS, timeout, or non-2xx response from the intake.
    #[error("transport error{}: {message}", status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Transport {
        /// HTTP status code, if a response was received at all.
        status: Option<u16>,
        /// Bounded body excerpt or connection error description.
        message: String,
    },

    /// Inventory probe failed beyond the per-field degradation point.
    #[error("collector error: {0}")]
    Collector(String),

    /// The cancellation token fired while an operation was in flight.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// True for errors a response was actually received for, i.e. the
    /// intake is reachable but rejected the batch.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AgentError::Transport { status: Some(_), .. })
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(e: serde_json::Error) -> Self {
        AgentError::Internal(format!("JSON serialization failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_includes_status_when_present() {
        let err = AgentError::Transport {
            status: Some(503),
            message: "overloaded".into(),
        };
        let text = err.to_string();
        assert!(text.contains("503"), "got: {text}");
        assert!(text.contains("overloaded"), "got: {text}");
    }

    #[test]
    fn transport_error_omits_status_when_absent() {
        let err = AgentError::Transport {
            status: None,
            message: "connection reset".into(),
        };
        assert_eq!(err.to_string(), "transport error: connection reset");
    }

    #[test]
    fn is_rejection_only_for_responses() {
        let rejected = AgentError::Transport {
            status: Some(400),
            message: String::new(),
        };
        let unreachable = AgentError::Transport {
            status: None,
            message: "dns failure".into(),
        };
        assert!(rejected.is_rejection());
        assert!(!unreachable.is_rejection());
    }
}
