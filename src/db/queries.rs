use crate::core::ports::DeliveryAttempt;
use crate::errors::{AppError, AppResult};
use crate::models::record::{parse_storage_timestamp, storage_timestamp};
use crate::models::{Action, AttendanceRecord, Watermark};
use chrono::{Local, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

fn parse_ts(raw: &str) -> AppResult<NaiveDateTime> {
    parse_storage_timestamp(raw).ok_or_else(|| AppError::InvalidTimestamp(raw.to_string()))
}

/// Newest synced instant for a device: the larger of the stored watermark
/// and the newest stored record.
pub fn load_watermark(conn: &Connection, device_name: &str) -> AppResult<Option<NaiveDateTime>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT MAX(ts) FROM (
                SELECT MAX(timestamp) AS ts FROM attendance_logs WHERE device_name = ?1
                UNION ALL
                SELECT last_timestamp AS ts FROM sync_watermarks WHERE device_name = ?1
             )",
            [device_name],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    raw.as_deref().map(parse_ts).transpose()
}

/// Upsert a device watermark; an older value never replaces a newer one.
pub fn save_watermark(conn: &Connection, wm: &Watermark) -> AppResult<()> {
    conn.execute(
        "INSERT INTO sync_watermarks (device_name, last_timestamp, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(device_name) DO UPDATE SET
            last_timestamp = MAX(last_timestamp, excluded.last_timestamp),
            updated_at     = excluded.updated_at",
        params![
            wm.device_name,
            storage_timestamp(&wm.last_timestamp),
            Local::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Insert all records in a single transaction.
pub fn insert_records(conn: &Connection, records: &[AttendanceRecord]) -> AppResult<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO attendance_logs (user_id, user_name, action, timestamp, device_name)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for r in records {
            inserted += stmt.execute(params![
                r.user_id,
                r.user_name,
                r.action.to_db_str(),
                r.storage_timestamp(),
                r.device_name,
            ])?;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

pub fn insert_sms_log(conn: &Connection, attempt: &DeliveryAttempt) -> AppResult<()> {
    conn.execute(
        "INSERT INTO sms_logs (recipient, message, http_status, response, outcome, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            attempt.recipient,
            attempt.message,
            attempt.http_status.map(i64::from),
            attempt.response,
            attempt.outcome,
            storage_timestamp(&attempt.attempted_at),
        ],
    )?;
    Ok(())
}

pub fn map_record(row: &Row) -> Result<AttendanceRecord> {
    let action_str: String = row.get("action")?;
    let action = Action::from_db_str(&action_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::Other(format!("Invalid action: {}", action_str))),
        )
    })?;

    let ts_str: String = row.get("timestamp")?;
    let timestamp = parse_storage_timestamp(&ts_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidTimestamp(ts_str.clone())),
        )
    })?;

    Ok(AttendanceRecord {
        user_id: row.get("user_id")?,
        user_name: row.get("user_name")?,
        action,
        timestamp,
        device_name: row.get("device_name")?,
    })
}

/// Stored records for a device in timestamp order.
pub fn load_records(conn: &Connection, device_name: &str) -> AppResult<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, user_name, action, timestamp, device_name
         FROM attendance_logs
         WHERE device_name = ?1
         ORDER BY timestamp ASC, id ASC",
    )?;
    let rows = stmt.query_map([device_name], map_record)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Audited notification attempts, oldest first, as (recipient, outcome).
pub fn load_sms_outcomes(conn: &Connection) -> AppResult<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT recipient, outcome FROM sms_logs ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
