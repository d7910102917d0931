//! Audit log: SQLite-based operation history.
//!
//! Stores a record of every write attempt (sync, edit, bulk sync) and every
//! export/import in a local SQLite database at `<store_dir>/audit.db`.
//! Secret values are never recorded, only names.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::cli::Context;
use crate::errors::{Result, VaultSyncError};

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub vault: String,
    pub secret_name: Option<String>,
    pub outcome: String,
    pub details: Option<String>,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `<store_dir>/audit.db`.
    ///
    /// Returns `None` if the database can't be opened: callers should
    /// treat this as "audit logging unavailable" and continue normally.
    pub fn open(store_dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(store_dir);
        let conn = Connection::open(&db_path).ok()?;

        // Owner-only permissions on the audit database.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                vault       TEXT NOT NULL,
                secret_name TEXT,
                outcome     TEXT NOT NULL,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Record an operation. Fire-and-forget: errors are silently ignored.
    pub fn log(
        &self,
        operation: &str,
        vault: &str,
        secret_name: Option<&str>,
        outcome: &str,
        details: Option<&str>,
    ) {
        let now = Utc::now().to_rfc3339();
        if let Err(e) = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, vault, secret_name, outcome, details)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![now, operation, vault, secret_name, outcome, details],
        ) {
            debug!(error = %e, operation, "audit write failed");
        }
    }

    /// Query recent audit entries.
    ///
    /// - `limit`: maximum number of entries to return (most recent first).
    /// - `since`: if provided, only return entries newer than this timestamp.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let (sql, params): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match since {
            Some(ref ts) => (
                "SELECT id, timestamp, operation, vault, secret_name, outcome, details
                 FROM audit_log
                 WHERE timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
                vec![
                    Box::new(ts.to_rfc3339()) as Box<dyn rusqlite::types::ToSql>,
                    Box::new(limit_i64),
                ],
            ),
            None => (
                "SELECT id, timestamp, operation, vault, secret_name, outcome, details
                 FROM audit_log
                 ORDER BY id DESC
                 LIMIT ?1",
                vec![Box::new(limit_i64) as Box<dyn rusqlite::types::ToSql>],
            ),
        };

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| VaultSyncError::AuditError(format!("query prepare: {e}")))?;

        let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| &**p).collect();

        let rows = stmt
            .query_map(params_refs.as_slice(), |row| {
                let ts_str: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    operation: row.get(2)?,
                    vault: row.get(3)?,
                    secret_name: row.get(4)?,
                    outcome: row.get(5)?,
                    details: row.get(6)?,
                })
            })
            .map_err(|e| VaultSyncError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| VaultSyncError::AuditError(format!("row parse: {e}")))?);
        }

        Ok(entries)
    }

    /// Return the path to the audit database.
    pub fn db_path(store_dir: &Path) -> PathBuf {
        store_dir.join("audit.db")
    }
}

/// Convenience helper: log an audit event for the current command.
///
/// Opens the audit database, logs the event, and silently ignores any errors.
/// Does nothing when auditing is disabled in settings.
pub fn log_audit(
    ctx: &Context,
    op: &str,
    vault: &str,
    name: Option<&str>,
    outcome: &str,
    details: Option<&str>,
) {
    if !ctx.settings.audit {
        return;
    }
    if let Some(audit) = AuditLog::open(&ctx.store_dir) {
        audit.log(op, vault, name, outcome, details);
    }
}

/// Log the result of an operation: `ok` on success, `failed` with the error text otherwise.
pub fn log_result<T>(
    ctx: &Context,
    op: &str,
    vault: &str,
    name: Option<&str>,
    result: &Result<T>,
    details: Option<&str>,
) {
    match result {
        Ok(_) => log_audit(ctx, op, vault, name, "ok", details),
        Err(e) => log_audit(ctx, op, vault, name, "failed", Some(&e.to_string())),
    }
}
