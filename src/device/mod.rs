//! Device SDK seam.
//!
//! A poll cycle connects, pauses capture, reads the full attendance log and
//! then resumes capture and disconnects. [`SessionGuard`] makes the last two
//! steps unconditional: they run when the guard is dropped, whatever path
//! the cycle took.

pub mod attlog;

pub use attlog::AttlogConnector;

use crate::config::DeviceConfig;
use crate::errors::AppResult;
use crate::models::RawEvent;
use std::time::Duration;

/// An open session with one device.
///
/// `resume_capture` must be safe to call without a prior pause, and
/// `disconnect` must be safe on a half-open session.
pub trait DeviceSession: Send {
    fn pause_capture(&mut self) -> AppResult<()>;
    fn resume_capture(&mut self) -> AppResult<()>;
    fn fetch_events(&mut self) -> AppResult<Vec<RawEvent>>;
    fn disconnect(&mut self) -> AppResult<()>;
}

/// Opens sessions, bounded by `timeout`.
pub trait DeviceConnector: Send + Sync {
    fn connect(&self, device: &DeviceConfig, timeout: Duration)
    -> AppResult<Box<dyn DeviceSession>>;
}

/// Owns a session and releases it on drop.
pub struct SessionGuard {
    session: Box<dyn DeviceSession>,
    device_name: String,
}

impl SessionGuard {
    pub fn new(session: Box<dyn DeviceSession>, device_name: &str) -> Self {
        Self {
            session,
            device_name: device_name.to_string(),
        }
    }

    /// Pause capture, read the full log. Capture is resumed on drop.
    pub fn read_log(&mut self) -> AppResult<Vec<RawEvent>> {
        self.session.pause_capture()?;
        self.session.fetch_events()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let device = self.device_name.as_str();
        match self.session.resume_capture() {
            Ok(()) => tracing::debug!(device, "device capture resumed"),
            Err(e) => tracing::error!(device, error = %e, "could not re-enable device"),
        }
        match self.session.disconnect() {
            Ok(()) => tracing::debug!(device, "device disconnected"),
            Err(e) => tracing::error!(device, error = %e, "error during disconnection"),
        }
    }
}
