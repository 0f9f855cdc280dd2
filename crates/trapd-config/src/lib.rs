// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration and filesystem layout for the TRAPD agent.
//!
//! Loads `config.json` from the data directory with compiled defaults for
//! anything missing, applies `*_OVERRIDE` environment variables, and clamps
//! numeric options into their documented ranges. Also resolves the data
//! directory itself and reads the API key secret.

pub mod loader;
pub mod model;
pub mod paths;
pub mod secrets;

pub use loader::load_config;
pub use model::{AgentConfig, LogLevel};
pub use paths::DataPaths;
pub use secrets::read_api_key;
