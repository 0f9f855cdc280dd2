// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shutdown signal wiring.
//!
//! The agent threads a single [`CancellationToken`] through the worker
//! loop, the sender's backoff sleeps, and the in-flight HTTP call. This
//! module owns the other end of that token: a background task that waits
//! for SIGTERM or SIGINT and cancels it. Leased queue items are not
//! touched on the way out; lease expiry reclaims them on the next start.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Create the agent's cancellation token and arm it on SIGTERM/SIGINT.
///
/// The returned token is the one handed to the worker; it fires once,
/// when the first signal arrives.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    tokio::spawn(watch_signals(token.clone()));
    token
}

async fn watch_signals(token: CancellationToken) {
    let signal = wait_for_signal().await;
    info!(signal, "shutdown signal received, cancelling worker");
    token.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = tokio::signal::ctrl_c() => "SIGINT",
            }
        }
        Err(e) => {
            // Service managers stop us with SIGTERM; without that handler
            // only an interactive Ctrl+C can trigger a clean shutdown.
            warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}
