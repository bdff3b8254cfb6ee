//! Per-device spreadsheet log.
//!
//! Rows live in a CSV ledger (`attendance_log_<Device>.csv`) that is only
//! ever appended to; after each append the whole ledger is rendered into
//! `attendance_log_<Device>.xlsx`. The read-modify-write runs under the
//! named lock of the workbook path.

mod xlsx;

use crate::core::ports::SheetSink;
use crate::errors::AppResult;
use crate::models::AttendanceRecord;
use crate::models::record::SHEET_HEADERS;
use crate::utils::lock::{NamedLocks, acquire};
use crate::utils::path::safe_file_stem;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub struct SheetLog {
    dir: PathBuf,
    locks: NamedLocks,
}

impl SheetLog {
    pub fn new(dir: impl Into<PathBuf>, locks: NamedLocks) -> Self {
        Self {
            dir: dir.into(),
            locks,
        }
    }

    pub fn ledger_path(&self, device_name: &str) -> PathBuf {
        self.dir
            .join(format!("attendance_log_{}.csv", safe_file_stem(device_name)))
    }

    pub fn workbook_path(&self, device_name: &str) -> PathBuf {
        self.dir
            .join(format!("attendance_log_{}.xlsx", safe_file_stem(device_name)))
    }

    /// Rows already in the ledger, header excluded.
    pub fn read_rows(&self, device_name: &str) -> AppResult<Vec<Vec<String>>> {
        read_ledger(&self.ledger_path(device_name))
    }
}

fn read_ledger(path: &Path) -> AppResult<Vec<Vec<String>>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for r in reader.records() {
        rows.push(r?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn append_ledger(path: &Path, records: &[AttendanceRecord]) -> AppResult<()> {
    let is_new = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    if is_new {
        wtr.write_record(SHEET_HEADERS)?;
    }
    for r in records {
        wtr.write_record(r.sheet_row())?;
    }
    wtr.flush()?;
    Ok(())
}

impl SheetSink for SheetLog {
    fn append_rows(&self, device_name: &str, records: &[AttendanceRecord]) -> AppResult<usize> {
        fs::create_dir_all(&self.dir)?;
        let workbook = self.workbook_path(device_name);
        let ledger = self.ledger_path(device_name);

        let lock = self.locks.get(&workbook.to_string_lossy());
        let _guard = acquire(&lock);

        append_ledger(&ledger, records)?;
        let rows = read_ledger(&ledger)?;
        xlsx::render_workbook(&rows, &workbook)?;

        tracing::info!(
            device = device_name,
            appended = records.len(),
            total = rows.len(),
            path = %workbook.display(),
            "appended rows to spreadsheet"
        );
        Ok(records.len())
    }
}
