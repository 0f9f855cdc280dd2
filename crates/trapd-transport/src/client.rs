// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the intake's batch events endpoint.
//!
//! Provides [`IntakeClient`] which handles request construction,
//! authentication, and response classification. The API key is held in a
//! [`SecretString`] and must never appear in logs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use trapd_core::version::normalize_version;
use trapd_core::{AgentError, LeasedItem};

/// Intake endpoint path, relative to the configured base URL.
const BATCH_PATH: &str = "/api/v1/events/batch";

/// Whole-request timeout covering connect, TLS, send, and body read.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest response-body excerpt kept for errors and logs.
const BODY_EXCERPT_CHARS: usize = 256;

/// HTTP client for intake communication.
pub struct IntakeClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    /// The first delivered batch per process is logged at info; later ones
    /// at debug.
    first_batch_logged: AtomicBool,
}

impl IntakeClient {
    /// Creates a client for `base_url`, e.g. `https://api.trapd.io`.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, AgentError> {
        let user_agent = format!(
            "TRAPD-Agent/{}",
            normalize_version(env!("CARGO_PKG_VERSION"))
        );
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AgentError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), BATCH_PATH),
            api_key,
            first_batch_logged: AtomicBool::new(false),
        })
    }

    /// Ship one batch to the intake.
    ///
    /// Any 2xx response is success. Non-2xx responses, timeouts, DNS, TLS,
    /// and connection failures all surface as [`AgentError::Transport`].
    pub async fn send_batch(&self, items: &[LeasedItem]) -> Result<(), AgentError> {
        let body = serialize_batch(items)?;

        if !self.first_batch_logged.swap(true, Ordering::Relaxed) {
            info!(count = items.len(), payload = %body, "sending first batch");
        } else {
            debug!(count = items.len(), payload = %body, "sending batch");
        }

        let response = self
            .http
            .post(&self.endpoint)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            )
            .bearer_auth(self.api_key.expose_secret())
            .body(body)
            .send()
            .await
            .map_err(|e| AgentError::Transport {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body_excerpt = excerpt(&response.text().await.unwrap_or_default());
        info!(status = status.as_u16(), body = %body_excerpt, "intake response");

        if status.is_success() {
            Ok(())
        } else {
            Err(AgentError::Transport {
                status: Some(status.as_u16()),
                message: body_excerpt,
            })
        }
    }
}

impl std::fmt::Debug for IntakeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Build the wire body: a JSON array with each item's payload re-embedded
/// as JSON structure, not as a string.
fn serialize_batch(items: &[LeasedItem]) -> Result<String, AgentError> {
    let mut events = Vec::with_capacity(items.len());
    for item in items {
        let payload: serde_json::Value =
            serde_json::from_str(&item.payload_json).map_err(|e| {
                AgentError::Internal(format!("item {} holds invalid payload JSON: {e}", item.id))
            })?;
        events.push(serde_json::json!({
            "id": item.id,
            "created_utc": item.created_utc,
            "type": item.kind,
            "payload": payload,
        }));
    }
    Ok(serde_json::Value::Array(events).to_string())
}

/// Bounded prefix of a response body, safe to log and attach to errors.
fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
