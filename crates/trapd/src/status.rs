// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `trapd status` command implementation.
//!
//! Prints the resolved data directory, sensor identity, and queue
//! statistics without starting the worker. Useful for checking what a
//! stuck host has accumulated offline.

use trapd_agent::resolve_sensor_id;
use trapd_config::DataPaths;
use trapd_core::AgentError;
use trapd_storage::EventQueue;

/// Run the `trapd status` command.
pub async fn run_status() -> Result<(), AgentError> {
    let paths = DataPaths::resolve()?;
    paths.ensure_created()?;

    let sensor = resolve_sensor_id(&paths.device_id_file);
    let queue = EventQueue::open(&paths.queue_db).await?;
    let stats = queue.stats().await?;

    println!("data dir:  {}", paths.root.display());
    println!("sensor id: {} ({})", sensor.id, sensor.source.as_str());
    println!(
        "queue:     {} pending, {} leased, {} sent, {} dead ({} total)",
        stats.pending, stats.leased, stats.sent, stats.dead, stats.total
    );

    queue.close().await?;
    Ok(())
}
