//! SQLite adapter for the attendance store and the SMS audit trail.
//!
//! Each operation opens its own short-lived connection with a bounded busy
//! timeout, so one store value can be shared by every device thread.

use crate::core::ports::{AuditLog, DeliveryAttempt, RecordStore};
use crate::db::migrate::run_pending_migrations;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use crate::models::{AttendanceRecord, Watermark};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    /// Open the store at `path`, creating the schema if needed.
    pub fn open(path: &Path, busy_timeout: Duration) -> AppResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            path: path.to_path_buf(),
            busy_timeout,
        };
        let pool = store.connect()?;
        let applied = run_pending_migrations(&pool.conn)?;
        if applied > 0 {
            tracing::info!(applied, path = %store.path.display(), "store schema upgraded");
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> AppResult<DbPool> {
        Ok(DbPool::new(&self.path, self.busy_timeout)?)
    }
}

impl RecordStore for SqliteStore {
    fn load_watermark(&self, device_name: &str) -> AppResult<Option<NaiveDateTime>> {
        let pool = self.connect()?;
        queries::load_watermark(&pool.conn, device_name)
    }

    fn insert_records(&self, records: &[AttendanceRecord]) -> AppResult<usize> {
        let pool = self.connect()?;
        queries::insert_records(&pool.conn, records)
    }

    fn save_watermark(&self, watermark: &Watermark) -> AppResult<()> {
        let pool = self.connect()?;
        queries::save_watermark(&pool.conn, watermark)
    }
}

impl AuditLog for SqliteStore {
    fn record_delivery(&self, attempt: &DeliveryAttempt) -> AppResult<()> {
        let pool = self.connect()?;
        queries::insert_sms_log(&pool.conn, attempt)
    }
}
