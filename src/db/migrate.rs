use crate::db::log::{MIGRATION_APPLIED, write_entry};
use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension};

/// A schema step, applied once and recorded in the `log` table.
struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20240501_0001_create_attendance_logs",
        description: "Created attendance_logs table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS attendance_logs (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id      TEXT NOT NULL,
            user_name    TEXT NOT NULL,
            action       TEXT NOT NULL,
            timestamp    TEXT NOT NULL,
            device_name  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_attendance_device_ts
            ON attendance_logs(device_name, timestamp);
        "#,
    },
    Migration {
        version: "20240501_0002_create_sms_logs",
        description: "Created sms_logs table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS sms_logs (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            recipient    TEXT NOT NULL DEFAULT '',
            message      TEXT NOT NULL,
            http_status  INTEGER,
            response     TEXT NOT NULL DEFAULT '',
            outcome      TEXT NOT NULL CHECK(outcome IN ('sent','rejected','failed')),
            timestamp    TEXT NOT NULL
        );
        "#,
    },
    Migration {
        version: "20240601_0003_create_sync_watermarks",
        description: "Created sync_watermarks table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS sync_watermarks (
            device_name     TEXT PRIMARY KEY,
            last_timestamp  TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );
        "#,
    },
];

/// Ensure that the `log` table exists; it doubles as migration registry.
fn ensure_log_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )
}

fn is_applied(conn: &Connection, version: &str) -> rusqlite::Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = ?1 AND target = ?2
         LIMIT 1",
    )?;
    Ok(chk
        .query_row([MIGRATION_APPLIED, version], |_| Ok(()))
        .optional()?
        .is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;
    write_entry(&tx, MIGRATION_APPLIED, m.version, m.description)?;
    tx.commit()?;

    tracing::info!(version = m.version, "migration applied");
    Ok(())
}

/// Public entry point: run all pending migrations. Returns how many ran.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }
        apply(conn, m)?;
        applied += 1;
    }

    Ok(applied)
}

/// Versions recorded as applied, oldest first.
pub fn applied_versions(conn: &Connection) -> AppResult<Vec<String>> {
    ensure_log_table(conn)?;
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([MIGRATION_APPLIED], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
