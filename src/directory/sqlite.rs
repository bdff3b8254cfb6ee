//! Directory adapter over a SQLite copy of the vendor `USERINFO` table.

use super::{DirectorySnapshot, DirectorySource};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::UserDetail;
use rusqlite::{OptionalExtension, params_from_iter};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const SNAPSHOT_FILE: &str = "directory.sqlite";

#[derive(Debug, Clone)]
pub struct SqliteDirectory {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteDirectory {
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DirectorySource for SqliteDirectory {
    fn open_snapshot(&self) -> AppResult<Box<dyn DirectorySnapshot>> {
        if !self.path.exists() {
            return Err(AppError::Directory(format!(
                "directory database not found: {}",
                self.path.display()
            )));
        }

        let dir = tempfile::Builder::new()
            .prefix("directory_batch_")
            .tempdir()?;
        let copy = dir.path().join(SNAPSHOT_FILE);
        fs::copy(&self.path, &copy)?;

        let pool = DbPool::read_only(&copy, self.busy_timeout)?;
        Ok(Box::new(SqliteSnapshot { pool, _dir: dir }))
    }
}

/// Connection to the copied file. Field order matters: the connection is
/// dropped before the temporary directory holding the file is removed.
struct SqliteSnapshot {
    pool: DbPool,
    _dir: TempDir,
}

fn detail_from_row(id: String, name: Option<String>, phone: Option<String>) -> UserDetail {
    UserDetail::new(id, name, phone)
}

impl DirectorySnapshot for SqliteSnapshot {
    fn lookup_batch(&self, ids: &[String]) -> AppResult<HashMap<String, UserDetail>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT CAST(SSN AS TEXT), Name, OPHONE FROM USERINFO WHERE SSN IN ({placeholders})"
        );

        let mut stmt = self.pool.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut out = HashMap::new();
        for r in rows {
            let (ssn, name, phone) = r?;
            out.entry(ssn.clone())
                .or_insert_with(|| detail_from_row(ssn, name, phone));
        }
        Ok(out)
    }

    fn lookup_one(&self, id: &str) -> AppResult<Option<UserDetail>> {
        let row = self
            .pool
            .conn
            .query_row(
                "SELECT Name, OPHONE FROM USERINFO WHERE TRIM(SSN) = ?1 LIMIT 1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(name, phone)| detail_from_row(id.to_string(), name, phone)))
    }
}
