// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes; the
//! queue file has exactly one writer per process.

use std::path::Path;

use tracing::debug;

use trapd_core::AgentError;

use crate::migrations;

/// How long a caller waits on a busy writer before erroring, milliseconds.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Handle to the agent's SQLite database.
///
/// Cheap to clone; all clones funnel into the same background thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and bring the
    /// schema up to date.
    ///
    /// WAL journaling with `synchronous=NORMAL` survives process crash;
    /// the last fsync window may be lost on host power loss.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let conn = tokio_rusqlite::Connection::open(path.as_ref())
            .await
            .map_err(map_tr_err)?;

        conn.call(|conn| {
            conn.execute_batch(&format!(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA busy_timeout={BUSY_TIMEOUT_MS};
                 PRAGMA foreign_keys=ON;"
            ))?;
            migrations::run_migrations(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!("database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL into the main file, typically before shutdown.
    pub async fn close(&self) -> Result<(), AgentError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into the agent's storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> AgentError {
    AgentError::Storage {
        source: Box::new(e),
    }
}
