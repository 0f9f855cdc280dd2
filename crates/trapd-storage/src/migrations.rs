// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open;
//! refinery's history table doubles as the schema version counter.

use trapd_core::AgentError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), AgentError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| AgentError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
