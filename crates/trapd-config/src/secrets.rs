// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API key loading.
//!
//! Decrypting `secrets/api_key.enc` is the platform integration's job; by
//! the time the agent reads it the file holds the usable key material. The
//! key lives in a [`SecretString`] from the moment it is read so it cannot
//! end up in logs or debug output.

use std::fs;

use secrecy::SecretString;
use tracing::warn;

use trapd_core::AgentError;

use crate::loader::non_empty_env;
use crate::paths::DataPaths;

/// Read the intake API key.
///
/// `API_KEY_OVERRIDE` takes precedence (logged as a warning); otherwise the
/// key file under `secrets/` is read as trimmed UTF-8. Missing, unreadable,
/// or empty key material is fatal at startup.
pub fn read_api_key(paths: &DataPaths) -> Result<SecretString, AgentError> {
    if let Some(key) = non_empty_env("API_KEY_OVERRIDE") {
        warn!("api key overridden from environment");
        return Ok(SecretString::from(key));
    }

    let raw = fs::read(&paths.api_key_file).map_err(|e| {
        AgentError::Secret(format!(
            "cannot read api key file {}: {e}",
            paths.api_key_file.display()
        ))
    })?;

    let key = String::from_utf8(raw)
        .map_err(|_| AgentError::Secret("api key file is not valid UTF-8".into()))?
        .trim()
        .to_string();

    if key.is_empty() {
        return Err(AgentError::Secret("api key file is empty".into()));
    }

    Ok(SecretString::from(key))
}
