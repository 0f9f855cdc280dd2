// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent startup wiring and the `run` / `once` commands.
//!
//! Resolves the data directory, loads config, reads the API key, opens the
//! queue, resolves identity, and hands everything to the worker. Fatal
//! startup errors bubble out of here and exit non-zero; once the worker is
//! running, everything is recovered locally until cancellation.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use trapd_agent::{resolve_sensor_id, shutdown, BatchSender, SystemCollector, Worker};
use trapd_config::{load_config, read_api_key, DataPaths, LogLevel};
use trapd_core::version::normalize_version;
use trapd_core::AgentError;
use trapd_storage::EventQueue;
use trapd_transport::IntakeClient;

/// How the agent loop is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Steady-state loop until SIGINT/SIGTERM.
    Forever,
    /// Exactly one collect/enqueue/send cycle.
    Once,
}

/// Start the agent in the given mode.
pub async fn run_agent(mode: RunMode) -> Result<(), AgentError> {
    let paths = DataPaths::resolve()?;
    paths.ensure_created()?;

    // Tracing comes up before validation so clamp warnings are visible.
    let config = load_config(&paths.config_file);
    let _log_guard = init_tracing(&config.log_level, &paths.log_file);
    let config = config.validated()?;

    info!(
        version = %normalize_version(env!("CARGO_PKG_VERSION")),
        data_dir = %paths.root.display(),
        api_url = %config.api_url,
        interval_s = config.interval_s,
        "trapd agent starting"
    );

    let api_key = read_api_key(&paths)?;
    let queue = EventQueue::open(&paths.queue_db).await?;
    let sensor = resolve_sensor_id(&paths.device_id_file);
    info!(
        sensor_id = %sensor.id,
        source = sensor.source.as_str(),
        "sensor identity resolved"
    );

    let client = IntakeClient::new(&config.api_url, api_key)?;
    let sender = BatchSender::new(queue.clone(), client, config.batch_size);
    let collector = Arc::new(SystemCollector::new());
    let mut worker = Worker::new(&config, sensor, collector, queue.clone(), sender);

    match mode {
        RunMode::Once => {
            worker.tick(&CancellationToken::new()).await?;
            queue.close().await?;
            info!("single cycle complete");
        }
        RunMode::Forever => {
            let cancel = shutdown::shutdown_token();
            worker.run(cancel).await;
            queue.close().await?;
            info!("shutdown complete");
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber: human-readable stderr plus an
/// append-only `agent.log` in the data directory.
///
/// The returned guard must stay alive for the process lifetime or buffered
/// file output is lost.
fn init_tracing(
    level: &LogLevel,
    log_file: &Path,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let directive = level.as_directive();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,trapd={directive},trapd_core={directive},trapd_config={directive},\
             trapd_storage={directive},trapd_transport={directive},trapd_agent={directive}"
        ))
    });

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let (dir, file_name) = match (log_file.parent(), log_file.file_name()) {
        (Some(dir), Some(name)) => (dir.to_path_buf(), name.to_owned()),
        _ => {
            // Degenerate path: log to stderr only.
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            return None;
        }
    };

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Some(guard)
}
