// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The durable event queue: leased-batch FIFO delivery over SQLite.
//!
//! Items move `Pending -> Leased -> Sent | Dead`; an expired or released
//! lease moves an item back to `Pending` and increments its retry count.
//! Every multi-step operation runs inside one transaction on the single
//! writer thread, so a batch claim or ack is never partially applied.

use std::time::Duration;

use rusqlite::{params, params_from_iter, types::Value};
use tracing::debug;

use trapd_core::{time, AgentError, LeasedItem, QueueStats};

use crate::database::{map_tr_err, Database};
use crate::models::{QueueItem, QueueStatus};

/// A crash-safe FIFO event queue with leased-batch semantics.
///
/// Cheap to clone; all clones share one writer thread.
#[derive(Clone)]
pub struct EventQueue {
    db: Database,
}

impl EventQueue {
    /// Open the queue file at `path`, creating and migrating as needed.
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self, AgentError> {
        let db = Database::open(path).await?;
        Ok(Self { db })
    }

    /// Wrap an already-open database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Checkpoint the WAL; call before shutdown.
    pub async fn close(&self) -> Result<(), AgentError> {
        self.db.close().await
    }

    /// Serialize `payload` and insert it as a new `Pending` item.
    ///
    /// Returns the store-assigned id.
    pub async fn enqueue(
        &self,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, AgentError> {
        self.enqueue_raw(kind, serde_json::to_string(payload)?).await
    }

    /// Insert an already-serialized JSON payload as a new `Pending` item.
    ///
    /// The queue stores the document opaquely; callers are responsible for
    /// it being valid JSON.
    pub async fn enqueue_raw(
        &self,
        kind: &str,
        payload_json: impl Into<String>,
    ) -> Result<i64, AgentError> {
        let kind = kind.to_string();
        let kind_owned = kind.clone();
        let payload_json = payload_json.into();
        let created_utc = time::utc_now();

        let id = self
            .db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO queue_items (created_utc, kind, payload_json, status, retry_count)
                     VALUES (?, ?, ?, ?, 0)",
                    params![created_utc, kind_owned, payload_json, QueueStatus::Pending.as_i64()],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(id, kind = %kind, "event enqueued");
        Ok(id)
    }

    /// Claim up to `batch_size` items for exclusive delivery until
    /// `now + lease_for`.
    ///
    /// One serialized transaction: expired leases are reclaimed first
    /// (back to `Pending`, retry count incremented), then the lowest-id
    /// `Pending` rows are claimed and returned in id order. The
    /// reclamation commits even when nothing is claimable.
    pub async fn lease_batch(
        &self,
        batch_size: usize,
        lease_for: Duration,
    ) -> Result<Vec<LeasedItem>, AgentError> {
        let now = time::utc_now();
        let lease_until = time::utc_after(lease_for);
        let limit = batch_size as i64;

        let (reclaimed, items) = self
            .db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction()?;

                let reclaimed = tx.execute(
                    "UPDATE queue_items
                     SET status = ?, lease_until_utc = NULL, retry_count = retry_count + 1
                     WHERE status = ? AND lease_until_utc <= ?",
                    params![
                        QueueStatus::Pending.as_i64(),
                        QueueStatus::Leased.as_i64(),
                        now
                    ],
                )?;

                let ids: Vec<i64> = {
                    let mut stmt = tx.prepare(
                        "SELECT id FROM queue_items WHERE status = ? ORDER BY id ASC LIMIT ?",
                    )?;
                    let rows = stmt.query_map(
                        params![QueueStatus::Pending.as_i64(), limit],
                        |row| row.get(0),
                    )?;
                    rows.collect::<Result<_, _>>()?
                };

                let mut items = Vec::with_capacity(ids.len());
                if !ids.is_empty() {
                    let marks = placeholders(ids.len());

                    let mut claim_params: Vec<Value> =
                        vec![QueueStatus::Leased.as_i64().into(), lease_until.into()];
                    claim_params.extend(ids.iter().map(|&id| Value::from(id)));
                    tx.execute(
                        &format!(
                            "UPDATE queue_items SET status = ?, lease_until_utc = ?
                             WHERE id IN ({marks})"
                        ),
                        params_from_iter(claim_params),
                    )?;

                    let mut stmt = tx.prepare(&format!(
                        "SELECT id, created_utc, kind, payload_json, retry_count
                         FROM queue_items WHERE id IN ({marks}) ORDER BY id ASC"
                    ))?;
                    let rows = stmt.query_map(
                        params_from_iter(ids.iter().map(|&id| Value::from(id))),
                        |row| {
                            Ok(LeasedItem {
                                id: row.get(0)?,
                                created_utc: row.get(1)?,
                                kind: row.get(2)?,
                                payload_json: row.get(3)?,
                                retry_count: row.get(4)?,
                            })
                        },
                    )?;
                    for row in rows {
                        items.push(row?);
                    }
                }

                tx.commit()?;
                Ok((reclaimed, items))
            })
            .await
            .map_err(map_tr_err)?;

        if reclaimed > 0 {
            debug!(reclaimed, "expired leases reclaimed");
        }
        if !items.is_empty() {
            debug!(count = items.len(), "batch leased");
        }
        Ok(items)
    }

    /// Transition the given items to `Sent` and clear their leases.
    ///
    /// Unconditional by id, so re-calling with the same ids is harmless.
    pub async fn mark_sent(&self, ids: &[i64]) -> Result<(), AgentError> {
        self.set_terminal(ids, QueueStatus::Sent).await
    }

    /// Transition the given items to `Dead` and clear their leases.
    ///
    /// The queue itself never calls this; policy layers above it may,
    /// e.g. after a retry-count threshold.
    pub async fn mark_dead(&self, ids: &[i64]) -> Result<(), AgentError> {
        self.set_terminal(ids, QueueStatus::Dead).await
    }

    async fn set_terminal(&self, ids: &[i64], status: QueueStatus) -> Result<(), AgentError> {
        if ids.is_empty() {
            return Ok(());
        }
        let ids = ids.to_vec();
        self.db
            .connection()
            .call(move |conn| {
                let marks = placeholders(ids.len());
                let mut sql_params: Vec<Value> = vec![status.as_i64().into()];
                sql_params.extend(ids.iter().map(|&id| Value::from(id)));
                conn.execute(
                    &format!(
                        "UPDATE queue_items SET status = ?, lease_until_utc = NULL
                         WHERE id IN ({marks})"
                    ),
                    params_from_iter(sql_params),
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Voluntarily return leased items to `Pending` for immediate re-lease.
    ///
    /// Counts as a retry. Items not currently `Leased` are left untouched.
    /// Do not call this on items that will also expire naturally; lease
    /// expiry already increments the retry count.
    pub async fn release_lease(&self, ids: &[i64]) -> Result<(), AgentError> {
        if ids.is_empty() {
            return Ok(());
        }
        let ids = ids.to_vec();
        self.db
            .connection()
            .call(move |conn| {
                let marks = placeholders(ids.len());
                let mut sql_params: Vec<Value> = vec![
                    QueueStatus::Pending.as_i64().into(),
                    QueueStatus::Leased.as_i64().into(),
                ];
                sql_params.extend(ids.iter().map(|&id| Value::from(id)));
                conn.execute(
                    &format!(
                        "UPDATE queue_items
                         SET status = ?, lease_until_utc = NULL, retry_count = retry_count + 1
                         WHERE status = ? AND id IN ({marks})"
                    ),
                    params_from_iter(sql_params),
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Permanently remove all `Sent` rows; returns the count removed.
    pub async fn delete_sent(&self) -> Result<usize, AgentError> {
        self.delete_terminal(QueueStatus::Sent).await
    }

    /// Permanently remove all `Dead` rows; returns the count removed.
    pub async fn delete_dead(&self) -> Result<usize, AgentError> {
        self.delete_terminal(QueueStatus::Dead).await
    }

    async fn delete_terminal(&self, status: QueueStatus) -> Result<usize, AgentError> {
        let removed = self
            .db
            .connection()
            .call(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM queue_items WHERE status = ?",
                    params![status.as_i64()],
                )?)
            })
            .await
            .map_err(map_tr_err)?;
        if removed > 0 {
            debug!(removed, status = ?status, "terminal rows deleted");
        }
        Ok(removed)
    }

    /// Bounded-growth safety valve: if the table holds more than
    /// `max_rows` rows, delete the lowest-id overflow regardless of
    /// status. Returns the count removed.
    pub async fn trim_oldest_by_count(&self, max_rows: u64) -> Result<u64, AgentError> {
        let removed = self
            .db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                let total: i64 =
                    tx.query_row("SELECT COUNT(*) FROM queue_items", [], |row| row.get(0))?;
                let excess = total - max_rows as i64;
                let removed = if excess > 0 {
                    tx.execute(
                        "DELETE FROM queue_items WHERE id IN
                         (SELECT id FROM queue_items ORDER BY id ASC LIMIT ?)",
                        params![excess],
                    )?
                } else {
                    0
                };
                tx.commit()?;
                Ok(removed as u64)
            })
            .await
            .map_err(map_tr_err)?;

        if removed > 0 {
            debug!(removed, max_rows, "queue trimmed to bound");
        }
        Ok(removed)
    }

    /// Fetch one full row by id, for diagnostics and tests.
    pub async fn get_item(&self, id: i64) -> Result<Option<QueueItem>, AgentError> {
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, created_utc, kind, payload_json, status,
                            lease_until_utc, retry_count, last_error
                     FROM queue_items WHERE id = ?",
                )?;
                let mut rows = stmt.query_map(params![id], |row| {
                    let status_raw: i64 = row.get(4)?;
                    let status = QueueStatus::from_i64(status_raw).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            4,
                            rusqlite::types::Type::Integer,
                            format!("unknown queue status {status_raw}").into(),
                        )
                    })?;
                    Ok(QueueItem {
                        id: row.get(0)?,
                        created_utc: row.get(1)?,
                        kind: row.get(2)?,
                        payload_json: row.get(3)?,
                        status,
                        lease_until_utc: row.get(5)?,
                        retry_count: row.get(6)?,
                        last_error: row.get(7)?,
                    })
                })?;
                match rows.next() {
                    Some(row) => Ok(Some(row?)),
                    None => Ok(None),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of `Pending` rows.
    pub async fn pending_count(&self) -> Result<u64, AgentError> {
        self.db
            .connection()
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM queue_items WHERE status = ?",
                    params![QueueStatus::Pending.as_i64()],
                    |row| row.get::<_, i64>(0),
                )? as u64)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Total row count across all statuses.
    pub async fn total_count(&self) -> Result<u64, AgentError> {
        self.db
            .connection()
            .call(|conn| {
                Ok(
                    conn.query_row("SELECT COUNT(*) FROM queue_items", [], |row| {
                        row.get::<_, i64>(0)
                    })? as u64,
                )
            })
            .await
            .map_err(map_tr_err)
    }

    /// Per-status row counts.
    pub async fn stats(&self) -> Result<QueueStats, AgentError> {
        self.db
            .connection()
            .call(|conn| {
                let mut stats = QueueStats {
                    pending: 0,
                    leased: 0,
                    sent: 0,
                    dead: 0,
                    total: 0,
                };
                let mut stmt =
                    conn.prepare("SELECT status, COUNT(*) FROM queue_items GROUP BY status")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? as u64))
                })?;
                for row in rows {
                    let (status, count) = row?;
                    match QueueStatus::from_i64(status) {
                        Some(QueueStatus::Pending) => stats.pending = count,
                        Some(QueueStatus::Leased) => stats.leased = count,
                        Some(QueueStatus::Sent) => stats.sent = count,
                        Some(QueueStatus::Dead) => stats.dead = count,
                        None => {}
                    }
                    stats.total += count;
                }
                Ok(stats)
            })
            .await
            .map_err(map_tr_err)
    }
}

/// `?, ?, ...` for an `IN` clause of `n` values.
fn placeholders(n: usize) -> String {
    let mut s = String::with_capacity(n * 3);
    for i in 0..n {
        if i > 0 {
            s.push_str(", ");
        }
        s.push('?');
    }
    s
}
