//! Device adapter reading the tab-separated ATTLOG export.
//!
//! Each line is `PIN \t YYYY-MM-DD HH:MM:SS \t verified \t status \t ...`,
//! where `status` is the punch code. The export usually sits on a share the
//! device (or its push service) writes to, so reads run on a helper thread
//! and are abandoned once the connect timeout elapses.

use super::{DeviceConnector, DeviceSession};
use crate::config::DeviceConfig;
use crate::errors::{AppError, AppResult};
use crate::models::RawEvent;
use crate::models::record::parse_storage_timestamp;
use crate::utils::path::expand_tilde;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};
use std::thread;
use std::time::Duration;

/// Exports with a read still running, shared by every session of a
/// connector. A hung share holds at most one reader thread per export.
#[derive(Debug, Default, Clone)]
pub struct AttlogConnector {
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

impl AttlogConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of exports whose read has not finished yet.
    pub fn reads_in_flight(&self) -> usize {
        lock_set(&self.in_flight).len()
    }
}

fn lock_set(set: &Mutex<HashSet<PathBuf>>) -> MutexGuard<'_, HashSet<PathBuf>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DeviceConnector for AttlogConnector {
    fn connect(
        &self,
        device: &DeviceConfig,
        timeout: Duration,
    ) -> AppResult<Box<dyn DeviceSession>> {
        let path = device.attlog.as_deref().map(expand_tilde).ok_or_else(|| {
            AppError::Device(format!("device '{}' has no attlog path", device.name))
        })?;

        tracing::info!(
            device = %device.name,
            ip = %device.ip,
            port = device.port,
            path = %path.display(),
            "opening attlog session"
        );

        Ok(Box::new(AttlogSession {
            path,
            timeout,
            in_flight: self.in_flight.clone(),
        }))
    }
}

struct AttlogSession {
    path: PathBuf,
    timeout: Duration,
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

impl DeviceSession for AttlogSession {
    // Exports are written by the device itself; there is no capture mode to
    // toggle from this side.
    fn pause_capture(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn resume_capture(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn fetch_events(&mut self) -> AppResult<Vec<RawEvent>> {
        if !lock_set(&self.in_flight).insert(self.path.clone()) {
            return Err(AppError::Device(format!(
                "previous read of {} is still in progress",
                self.path.display()
            )));
        }

        let (tx, rx) = mpsc::channel();
        let path = self.path.clone();
        let in_flight = self.in_flight.clone();
        let spawned = thread::Builder::new()
            .name("attlog-read".into())
            .spawn(move || {
                let result = read_attlog(&path);
                lock_set(&in_flight).remove(&path);
                if tx.send(result).is_err() {
                    tracing::debug!(path = %path.display(), "late attlog read discarded");
                }
            });
        if let Err(e) = spawned {
            lock_set(&self.in_flight).remove(&self.path);
            return Err(e.into());
        }

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "abandoning attlog read after timeout"
                );
                Err(AppError::Device(format!(
                    "timed out after {:?} reading {}",
                    self.timeout,
                    self.path.display()
                )))
            }
        }
    }

    fn disconnect(&mut self) -> AppResult<()> {
        Ok(())
    }
}

/// Parse one export line; `None` for anything malformed.
pub fn parse_line(record: &StringRecord) -> Option<RawEvent> {
    let user_id = record.get(0)?.trim();
    if user_id.is_empty() {
        return None;
    }
    let timestamp = parse_storage_timestamp(record.get(1)?)?;
    let action_code = record.get(3)?.trim().parse::<i32>().ok()?;
    Some(RawEvent::new(user_id, timestamp, action_code))
}

/// Read every well-formed event from an ATTLOG export.
pub fn read_attlog(path: &Path) -> AppResult<Vec<RawEvent>> {
    if !path.exists() {
        return Err(AppError::Device(format!(
            "attlog export not found: {}",
            path.display()
        )));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let mut events = Vec::new();
    let mut skipped = 0usize;
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        match parse_line(&row) {
            Some(ev) => events.push(ev),
            None => {
                skipped += 1;
                tracing::warn!(line = line + 1, "skipping malformed attlog line");
            }
        }
    }

    tracing::debug!(read = events.len(), skipped, path = %path.display(), "attlog read");
    Ok(events)
}
