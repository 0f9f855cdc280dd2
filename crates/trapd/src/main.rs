// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TRAPD - endpoint telemetry agent.
//!
//! Binary entry point. The agent collects host inventory heartbeats on a
//! jittered cadence, persists them in a local crash-safe queue, and drains
//! the queue to the intake with at-least-once delivery.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod run;
mod status;

/// TRAPD - endpoint telemetry agent.
#[derive(Parser, Debug)]
#[command(name = "trapd", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the agent until interrupted (default).
    Run,
    /// Perform exactly one collect/enqueue/send cycle, then exit.
    Once,
    /// Print the resolved identity and queue statistics.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run::run_agent(run::RunMode::Forever).await,
        Commands::Once => run::run_agent(run::RunMode::Once).await,
        Commands::Status => status::run_status().await,
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
