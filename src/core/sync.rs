//! Per-device polling loop.
//!
//! ```text
//! Idle -> Connecting -> Fetching -> Batching -> Advancing -> Idle
//!   \__________________ Error (any state) _________________/
//! ```
//!
//! The watermark only moves after a batch has been handed to every sink,
//! and only forwards.

use crate::config::{Config, DeviceConfig};
use crate::core::batch::{BatchProcessor, BatchReport};
use crate::core::ports::RecordStore;
use crate::core::shutdown::Shutdown;
use crate::device::{DeviceConnector, SessionGuard};
use crate::errors::AppResult;
use crate::models::{RawEvent, Watermark};
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Connecting,
    Fetching,
    Batching,
    Advancing,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub connect_timeout: Duration,
}

impl SyncSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            poll_interval: cfg.poll_interval(),
            batch_size: cfg.batch_size.max(1),
            connect_timeout: cfg.connect_timeout(),
        }
    }
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub fetched: usize,
    pub pending: usize,
    pub batches: Vec<BatchReport>,
    pub watermark: Option<NaiveDateTime>,
    pub interrupted: bool,
}

impl CycleReport {
    pub fn records_written(&self) -> usize {
        self.batches.iter().map(|b| b.output.records.len()).sum()
    }
}

/// Keep events newer than `watermark`, oldest first.
pub fn select_pending(mut events: Vec<RawEvent>, watermark: &Watermark) -> Vec<RawEvent> {
    events.retain(|e| watermark.admits(e.timestamp));
    events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    events
}

pub struct SyncDriver {
    device: DeviceConfig,
    settings: SyncSettings,
    connector: Arc<dyn DeviceConnector>,
    processor: BatchProcessor,
    store: Arc<dyn RecordStore>,
    shutdown: Shutdown,
    watermark: Watermark,
    state: SyncState,
}

impl SyncDriver {
    /// Load the persisted watermark and build the driver.
    ///
    /// Failing to read the watermark is a startup error: polling without it
    /// would resend the whole device history.
    pub fn start(
        device: DeviceConfig,
        settings: SyncSettings,
        connector: Arc<dyn DeviceConnector>,
        processor: BatchProcessor,
        store: Arc<dyn RecordStore>,
        shutdown: Shutdown,
    ) -> AppResult<Self> {
        let watermark = match store.load_watermark(&device.name)? {
            Some(ts) => {
                tracing::info!(device = %device.name, last = %ts, "last processed timestamp");
                Watermark::new(&device.name, ts)
            }
            None => {
                tracing::info!(device = %device.name, "no previous logs, will process all");
                Watermark::initial(&device.name)
            }
        };

        Ok(Self {
            device,
            settings,
            connector,
            processor,
            store,
            shutdown,
            watermark,
            state: SyncState::Idle,
        })
    }

    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn device(&self) -> &DeviceConfig {
        &self.device
    }

    fn transition(&mut self, next: SyncState) {
        tracing::trace!(device = %self.device.name, from = ?self.state, to = ?next, "sync state");
        self.state = next;
    }

    fn fetch(&mut self) -> AppResult<Vec<RawEvent>> {
        self.transition(SyncState::Connecting);
        let session = self
            .connector
            .connect(&self.device, self.settings.connect_timeout)?;
        let mut guard = SessionGuard::new(session, &self.device.name);

        self.transition(SyncState::Fetching);
        guard.read_log()
    }

    /// Run a single poll cycle.
    pub fn poll_once(&mut self) -> AppResult<CycleReport> {
        let name = self.device.name.clone();
        tracing::info!(device = %name, ip = %self.device.ip, "polling for new logs");

        let events = match self.fetch() {
            Ok(events) => events,
            Err(e) => {
                self.transition(SyncState::Error);
                return Err(e);
            }
        };

        let mut report = CycleReport {
            fetched: events.len(),
            ..CycleReport::default()
        };

        let pending = select_pending(events, &self.watermark);
        report.pending = pending.len();
        if pending.is_empty() {
            tracing::info!(device = %name, "no new logs");
            self.transition(SyncState::Idle);
            return Ok(report);
        }
        tracing::info!(device = %name, count = pending.len(), "found new logs");

        self.transition(SyncState::Batching);
        let mut last_completed: Option<NaiveDateTime> = None;
        let mut remaining = pending.len();
        for batch in pending.chunks(self.settings.batch_size) {
            if self.shutdown.is_requested() {
                tracing::info!(device = %name, remaining, "stop requested, leaving remaining batches");
                report.interrupted = true;
                break;
            }

            let batch_report = self.processor.process(batch, &name);
            remaining -= batch.len();
            last_completed = batch.last().map(|e| e.timestamp);
            report.batches.push(batch_report);
            tracing::info!(device = %name, remaining, "batch finished");
        }

        self.transition(SyncState::Advancing);
        if let Some(ts) = last_completed {
            self.advance(ts);
        }
        report.watermark = Some(self.watermark.last_timestamp);

        self.transition(SyncState::Idle);
        Ok(report)
    }

    fn advance(&mut self, ts: NaiveDateTime) {
        if !self.watermark.advance(ts) {
            return;
        }
        tracing::info!(
            device = %self.device.name,
            last = %self.watermark.last_timestamp,
            "finished all batches, new last timestamp"
        );
        if let Err(e) = self.store.save_watermark(&self.watermark) {
            tracing::error!(device = %self.device.name, error = %e, "could not persist watermark");
        }
    }

    /// Poll until a stop is requested. Cycle errors are logged and the loop
    /// carries on after the poll delay.
    pub fn run(mut self) {
        tracing::info!(device = %self.device.name, "starting polling loop");
        loop {
            if self.shutdown.is_requested() {
                break;
            }

            if let Err(e) = self.poll_once() {
                self.transition(SyncState::Error);
                tracing::error!(
                    device = %self.device.name,
                    error = %e,
                    error_debug = ?e,
                    "error in polling cycle"
                );
            }
            self.transition(SyncState::Idle);

            tracing::debug!(
                device = %self.device.name,
                wait_secs = self.settings.poll_interval.as_secs(),
                "polling cycle complete"
            );
            if self.shutdown.wait(self.settings.poll_interval) {
                break;
            }
        }
        tracing::info!(device = %self.device.name, "polling loop stopped");
    }
}
