//! Internal audit rows in the `log` table. Migrations register themselves
//! here too, under the `migration_applied` operation.

use crate::errors::AppResult;
use chrono::Local;
use rusqlite::{Connection, params};

pub const MIGRATION_APPLIED: &str = "migration_applied";

/// Append one `(date, operation, target, message)` row.
pub fn write_entry(
    conn: &Connection,
    operation: &str,
    target: &str,
    message: &str,
) -> AppResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message) VALUES (?1, ?2, ?3, ?4)",
    )?;
    stmt.execute(params![Local::now().to_rfc3339(), operation, target, message])?;
    tracing::debug!(operation, target, "internal log entry written");
    Ok(())
}
