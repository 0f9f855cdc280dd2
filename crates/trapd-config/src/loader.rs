// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for defaults-plus-file merging.
//!
//! A missing `config.json` is normal (defaults apply); a malformed one is
//! logged and ignored rather than fatal, so a corrupt file cannot keep the
//! agent from heartbeating. Environment overrides are applied after the
//! merge and each one is logged as a warning.

use std::env;
use std::path::Path;

use figment::{
    providers::{Format, Json, Serialized},
    Figment,
};
use tracing::warn;

use crate::model::AgentConfig;

/// Load the agent configuration from `path` with env overrides applied.
///
/// Never fails: file problems degrade to compiled defaults. Callers still
/// need [`AgentConfig::validated`] for clamping and the `project_id` check.
pub fn load_config(path: &Path) -> AgentConfig {
    let figment = Figment::new()
        .merge(Serialized::defaults(AgentConfig::default()))
        .merge(Json::file(path));

    let mut config: AgentConfig = match figment.extract() {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config file unusable, using defaults");
            AgentConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    config
}

/// Apply `API_URL_OVERRIDE` and `PROJECT_ID_OVERRIDE` on top of file values.
fn apply_env_overrides(config: &mut AgentConfig) {
    if let Some(url) = non_empty_env("API_URL_OVERRIDE") {
        warn!(api_url = %url, "api_url overridden from environment");
        config.api_url = url;
    }
    if let Some(project_id) = non_empty_env("PROJECT_ID_OVERRIDE") {
        warn!("project_id overridden from environment");
        config.project_id = Some(project_id);
    }
}

/// Read an environment variable, treating empty values as unset.
pub(crate) fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
