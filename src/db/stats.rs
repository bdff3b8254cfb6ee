use crate::db::log::MIGRATION_APPLIED;
use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::OptionalExtension;
use std::fs;
use std::path::Path;

pub fn print_db_info(pool: &mut DbPool, db_path: &Path) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!(
        "{}• File:{} {}{}{}",
        CYAN,
        RESET,
        YELLOW,
        db_path.display(),
        RESET
    );
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) TOTALS
    //
    let records: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM attendance_logs", [], |row| row.get(0))?;
    let sms: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM sms_logs", [], |row| row.get(0))?;
    println!(
        "{}• Attendance records:{} {}{}{}",
        CYAN, RESET, GREEN, records, RESET
    );
    println!("{}• SMS attempts:{} {}{}{}", CYAN, RESET, GREEN, sms, RESET);

    //
    // 3) PER-DEVICE RANGE
    //
    let mut stmt = pool.conn.prepare(
        "SELECT device_name, MIN(timestamp), MAX(timestamp), COUNT(*)
         FROM attendance_logs
         GROUP BY device_name
         ORDER BY device_name ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, i64>(3)?,
        ))
    })?;

    println!("{}• Devices:{}", CYAN, RESET);
    for r in rows {
        let (device, first, last, count) = r?;
        let first = first.unwrap_or_else(|| format!("{GREY}--{RESET}"));
        let last = last.unwrap_or_else(|| format!("{GREY}--{RESET}"));
        println!("    {device}: {count} records, from {first} to {last}");
    }

    //
    // 4) LAST MIGRATION
    //
    let last_migration: Option<String> = pool
        .conn
        .query_row(
            "SELECT target FROM log WHERE operation = ?1 ORDER BY id DESC LIMIT 1",
            [MIGRATION_APPLIED],
            |row| row.get(0),
        )
        .optional()?;
    println!(
        "{}• Schema:{} {}",
        CYAN,
        RESET,
        last_migration.unwrap_or_else(|| format!("{GREY}--{RESET}"))
    );

    println!();
    Ok(())
}
