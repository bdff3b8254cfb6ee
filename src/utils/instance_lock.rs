//! Single-instance guard using PID files.
//!
//! Locks are per device: two pollers reading the same device would each keep
//! their own watermark and double-insert records, so a command refuses to
//! start while the PID file of any device it polls exists.

use crate::config::DeviceConfig;
use crate::errors::{AppError, AppResult};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct InstanceLock {
    pid_file: PathBuf,
}

impl InstanceLock {
    /// Create `<dir>/attendsync_<scope>.pid` holding the current PID.
    ///
    /// Fails if the file already exists.
    pub fn acquire(dir: &Path, scope: &str) -> AppResult<Self> {
        fs::create_dir_all(dir)?;
        let pid_file = dir.join(format!("attendsync_{scope}.pid"));

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&pid_file)
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&pid_file).unwrap_or_default();
                tracing::error!(
                    path = %pid_file.display(),
                    existing_pid = holder.trim(),
                    "instance_lock.already_present"
                );
                return Err(AppError::AlreadyRunning(format!(
                    "PID file '{}' already exists (pid {})",
                    pid_file.display(),
                    holder.trim()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let pid = std::process::id();
        file.write_all(pid.to_string().as_bytes())?;
        tracing::info!(pid, path = %pid_file.display(), "instance_lock.acquired");

        Ok(Self { pid_file })
    }

    /// Lock every device in `devices`. On failure the locks already taken
    /// are released before returning.
    pub fn acquire_devices(dir: &Path, devices: &[DeviceConfig]) -> AppResult<Vec<Self>> {
        devices
            .iter()
            .map(|d| Self::acquire(dir, &d.safe_name()))
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.pid_file
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.pid_file) {
            Ok(()) => tracing::info!(path = %self.pid_file.display(), "instance_lock.released"),
            Err(err) => tracing::error!(
                error = %err,
                path = %self.pid_file.display(),
                "instance_lock.release_failed"
            ),
        }
    }
}
