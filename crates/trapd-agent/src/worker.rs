// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The worker loop: collect, enqueue, drain, sleep.
//!
//! One tick gathers an inventory snapshot, wraps it in a heartbeat
//! envelope, persists it, and invokes the sender for a drain cycle. Ticks
//! repeat at the configured cadence with a ±10% jitter so fleets do not
//! thunder against the intake in lockstep. Every sleep observes the
//! cancellation token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use trapd_config::AgentConfig;
use trapd_core::version::normalize_version;
use trapd_core::{time, AgentError};
use trapd_storage::EventQueue;

use crate::collector::InventoryCollector;
use crate::envelope::{AgentMeta, HeartbeatEnvelope};
use crate::identity::SensorId;
use crate::sender::{BatchSender, DrainOutcome};

/// Pause after a failed tick before resuming the loop.
const ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Cadence jitter bound: sleeps land in `interval * (1 ± JITTER)`.
const JITTER: f64 = 0.10;

/// Drives the periodic collect -> enqueue -> drain cycle.
pub struct Worker {
    sensor_id: SensorId,
    project_id: String,
    interval: Duration,
    collector: Arc<dyn InventoryCollector>,
    queue: EventQueue,
    sender: BatchSender,
    /// Process start, owned here rather than in a global.
    started_at: Instant,
    started_at_utc: String,
}

impl Worker {
    pub fn new(
        config: &AgentConfig,
        sensor_id: SensorId,
        collector: Arc<dyn InventoryCollector>,
        queue: EventQueue,
        sender: BatchSender,
    ) -> Self {
        Self {
            sensor_id,
            project_id: config.project_id().to_string(),
            interval: config.interval(),
            collector,
            queue,
            sender,
            started_at: Instant::now(),
            started_at_utc: time::utc_now(),
        }
    }

    /// Steady-state loop until cancellation.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            interval_s = self.interval.as_secs(),
            sensor_id = %self.sensor_id.id,
            "worker loop started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if let Err(err) = self.tick(&cancel).await {
                if cancel.is_cancelled() {
                    break;
                }
                error!(error = %err, "tick failed");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(ERROR_PAUSE) => {}
                }
            }

            let delay = jittered_interval(self.interval);
            debug!(delay_ms = delay.as_millis() as u64, "sleeping until next tick");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("worker loop stopped");
    }

    /// One collect -> enqueue -> drain cycle.
    pub async fn tick(&mut self, cancel: &CancellationToken) -> Result<DrainOutcome, AgentError> {
        let snapshot = self.collector.collect()?;
        let envelope = HeartbeatEnvelope::new(
            &self.sensor_id.id,
            &self.project_id,
            snapshot,
            self.agent_meta(),
        );
        let payload = serde_json::to_value(&envelope)?;
        self.queue.enqueue("heartbeat", &payload).await?;
        self.sender.run_once(cancel).await
    }

    fn agent_meta(&self) -> AgentMeta {
        AgentMeta {
            version: normalize_version(env!("CARGO_PKG_VERSION")),
            uptime_seconds: Some(self.started_at.elapsed().as_secs()),
            last_restart: Some(self.started_at_utc.clone()),
        }
    }
}

/// `interval * (1 + u)` with `u` uniform in `[-0.10, +0.10]`.
pub fn jittered_interval(interval: Duration) -> Duration {
    let u: f64 = rand::rng().random_range(-JITTER..=JITTER);
    interval.mul_f64(1.0 + u)
}
