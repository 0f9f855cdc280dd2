// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data directory resolution and the file layout inside it.
//!
//! Everything the agent persists lives under a single data directory:
//! `config.json`, `secrets/api_key.enc`, `queue.db`, `agent.log`, and
//! `device_id.txt`. `DATA_DIR_OVERRIDE` takes precedence; otherwise the
//! platform data directory joined with the product name is used.

use std::fs;
use std::path::{Path, PathBuf};

use trapd_core::AgentError;

use crate::loader::non_empty_env;

/// Product directory name under the platform data dir.
const PRODUCT_DIR: &str = "trapd";

/// Resolved locations of every file the agent persists.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub api_key_file: PathBuf,
    pub queue_db: PathBuf,
    pub log_file: PathBuf,
    pub device_id_file: PathBuf,
}

impl DataPaths {
    /// Resolve the data directory: `DATA_DIR_OVERRIDE` if non-empty, else
    /// the platform data directory joined with the product name.
    pub fn resolve() -> Result<Self, AgentError> {
        if let Some(dir) = non_empty_env("DATA_DIR_OVERRIDE") {
            return Ok(Self::from_root(PathBuf::from(dir)));
        }
        let base = dirs::data_dir().ok_or_else(|| {
            AgentError::Config(
                "no platform data directory available; set DATA_DIR_OVERRIDE".into(),
            )
        })?;
        Ok(Self::from_root(base.join(PRODUCT_DIR)))
    }

    /// Build the layout for an explicit root directory.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_file: root.join("config.json"),
            api_key_file: root.join("secrets").join("api_key.enc"),
            queue_db: root.join("queue.db"),
            log_file: root.join("agent.log"),
            device_id_file: root.join("device_id.txt"),
            root,
        }
    }

    /// Create the root and `secrets/` directories.
    ///
    /// An unwritable data directory is fatal at startup.
    pub fn ensure_created(&self) -> Result<(), AgentError> {
        create_dir(&self.root)?;
        create_dir(&self.root.join("secrets"))
    }
}

fn create_dir(path: &Path) -> Result<(), AgentError> {
    fs::create_dir_all(path).map_err(|e| {
        AgentError::Config(format!(
            "cannot create data directory {}: {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_derives_all_paths_from_root() {
        let paths = DataPaths::from_root("/tmp/trapd-test");
        assert_eq!(paths.config_file, Path::new("/tmp/trapd-test/config.json"));
        assert_eq!(
            paths.api_key_file,
            Path::new("/tmp/trapd-test/secrets/api_key.enc")
        );
        assert_eq!(paths.queue_db, Path::new("/tmp/trapd-test/queue.db"));
        assert_eq!(paths.log_file, Path::new("/tmp/trapd-test/agent.log"));
        assert_eq!(
            paths.device_id_file,
            Path::new("/tmp/trapd-test/device_id.txt")
        );
    }

    #[test]
    fn ensure_created_builds_root_and_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::from_root(dir.path().join("agent"));
        paths.ensure_created().unwrap();
        assert!(paths.root.is_dir());
        assert!(paths.root.join("secrets").is_dir());
    }

    #[test]
    fn ensure_created_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::from_root(dir.path().join("agent"));
        paths.ensure_created().unwrap();
        paths.ensure_created().unwrap();
    }
}
