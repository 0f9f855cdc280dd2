// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The batch sender: one drain cycle per call.
//!
//! A drain cycle leases a batch, ships it, and acks on success. On failure
//! the items are deliberately NOT released: lease expiry is the single
//! reclamation path, which makes crash behaviour identical to failure
//! behaviour and removes the race between an explicit release and a
//! parallel reclamation. The sender tracks consecutive failures and sleeps
//! an exponentially growing, capped backoff after each one.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use trapd_core::AgentError;
use trapd_storage::EventQueue;
use trapd_transport::IntakeClient;

/// How long a claimed batch stays exclusively ours.
const LEASE_FOR: Duration = Duration::from_secs(300);

/// Backoff ceiling.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Queue had nothing pending; neither success nor failure is counted.
    Idle,
    /// Batch delivered and acked; the failure counter was reset.
    Delivered(usize),
    /// Delivery failed; items stay leased until expiry, backoff was slept.
    Failed,
    /// Cancellation fired mid-cycle; no failure counted, no backoff slept.
    Cancelled,
}

/// Executes drain cycles against the queue and tracks backoff state.
pub struct BatchSender {
    queue: EventQueue,
    client: IntakeClient,
    batch_size: usize,
    lease_for: Duration,
    consecutive_failures: u32,
}

impl BatchSender {
    pub fn new(queue: EventQueue, client: IntakeClient, batch_size: usize) -> Self {
        Self {
            queue,
            client,
            batch_size,
            lease_for: LEASE_FOR,
            consecutive_failures: 0,
        }
    }

    /// Overrides the lease duration (for tests exercising expiry).
    #[cfg(test)]
    pub fn with_lease_for(mut self, lease_for: Duration) -> Self {
        self.lease_for = lease_for;
        self
    }

    /// Consecutive failed drain cycles since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Run one drain cycle.
    ///
    /// Storage errors propagate to the caller; transport failures are
    /// absorbed into the failure counter and backoff sleep.
    pub async fn run_once(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<DrainOutcome, AgentError> {
        let items = self.queue.lease_batch(self.batch_size, self.lease_for).await?;
        if items.is_empty() {
            return Ok(DrainOutcome::Idle);
        }

        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();

        let sent = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("cancelled mid-send, leaving batch leased");
                return Ok(DrainOutcome::Cancelled);
            }
            result = self.client.send_batch(&items) => result,
        };

        match sent {
            Ok(()) => {
                self.queue.mark_sent(&ids).await?;
                self.consecutive_failures = 0;
                info!(count = ids.len(), "batch delivered");
                Ok(DrainOutcome::Delivered(ids.len()))
            }
            Err(err) => {
                if cancel.is_cancelled() {
                    return Ok(DrainOutcome::Cancelled);
                }
                self.consecutive_failures += 1;
                let delay = backoff_delay(self.consecutive_failures);
                warn!(
                    error = %err,
                    failures = self.consecutive_failures,
                    backoff_s = delay.as_secs(),
                    "batch delivery failed, backing off"
                );
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
                Ok(DrainOutcome::Failed)
            }
        }
    }
}

/// `min(60s, 2^min(failures, 6) seconds)`.
pub fn backoff_delay(failures: u32) -> Duration {
    let exp = failures.min(6);
    MAX_BACKOFF.min(Duration::from_secs(1u64 << exp))
}
