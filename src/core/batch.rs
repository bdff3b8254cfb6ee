//! Batch processing: resolve, classify, format, then deliver to each sink.

use crate::core::ports::{Notifier, RecordStore, SheetSink};
use crate::directory::{DirectorySource, IdentityResolver};
use crate::models::{Action, AttendanceRecord, NotificationMessage, RawEvent};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// The three destinations of a batch.
#[derive(Clone)]
pub struct Sinks {
    pub sheet: Arc<dyn SheetSink>,
    pub store: Arc<dyn RecordStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// What one batch produced before delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutput {
    pub records: Vec<AttendanceRecord>,
    pub messages: Vec<NotificationMessage>,
    pub unresolved: usize,
    pub unknown_action: usize,
}

/// Result of delivering to a single sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Written(usize),
    Skipped,
    Failed(String),
}

impl SinkOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SinkOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub output: BatchOutput,
    pub sheet: SinkOutcome,
    pub store: SinkOutcome,
    pub sent: usize,
    pub failed_sends: usize,
}

pub struct BatchProcessor {
    directory: Arc<dyn DirectorySource>,
    sinks: Sinks,
    template: String,
    send_delay: Duration,
    /// When the previous notification went out, across batches and cycles.
    last_send: Mutex<Option<Instant>>,
}

impl BatchProcessor {
    pub fn new(
        directory: Arc<dyn DirectorySource>,
        sinks: Sinks,
        template: impl Into<String>,
        send_delay: Duration,
    ) -> Self {
        Self {
            directory,
            sinks,
            template: template.into(),
            send_delay,
            last_send: Mutex::new(None),
        }
    }

    /// Keep at least `send_delay` between two consecutive sends.
    fn pace(&self) {
        let mut last = self.last_send.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = *last {
            let since = prev.elapsed();
            if since < self.send_delay {
                thread::sleep(self.send_delay - since);
            }
        }
        *last = Some(Instant::now());
    }

    /// Resolve identities once for the batch, then build records and
    /// messages in input order.
    pub fn prepare(&self, events: &[RawEvent], device_name: &str) -> BatchOutput {
        let ids: HashSet<String> = events.iter().map(|e| e.user_id.clone()).collect();
        let users = IdentityResolver::new(self.directory.as_ref()).resolve(&ids);

        let mut out = BatchOutput::default();
        for ev in events {
            tracing::debug!(
                device = device_name,
                user_id = %ev.user_id,
                timestamp = %ev.timestamp,
                punch = ev.action_code,
                "raw log"
            );

            let Some(user) = users.get(&ev.user_id) else {
                out.unresolved += 1;
                continue;
            };

            let Some(action) = Action::classify(ev.action_code) else {
                tracing::warn!(
                    device = device_name,
                    user_id = %ev.user_id,
                    punch = ev.action_code,
                    "skipping log with unknown punch type"
                );
                out.unknown_action += 1;
                continue;
            };

            let record = AttendanceRecord::new(user, action, ev.timestamp, device_name);
            if let Some(phone) = user.phone() {
                out.messages
                    .push(NotificationMessage::render(&self.template, &record, phone));
            }
            out.records.push(record);
        }
        out
    }

    /// Deliver to spreadsheet, store, then notifications. A failing sink is
    /// logged and never stops the ones after it.
    pub fn deliver(&self, output: BatchOutput, device_name: &str) -> BatchReport {
        let sheet = if output.records.is_empty() {
            SinkOutcome::Skipped
        } else {
            match self.sinks.sheet.append_rows(device_name, &output.records) {
                Ok(n) => SinkOutcome::Written(n),
                Err(e) => {
                    tracing::error!(device = device_name, error = %e, "spreadsheet append failed");
                    SinkOutcome::Failed(e.to_string())
                }
            }
        };

        let store = if output.records.is_empty() {
            SinkOutcome::Skipped
        } else {
            match self.sinks.store.insert_records(&output.records) {
                Ok(n) => {
                    tracing::info!(device = device_name, inserted = n, "batch inserted records");
                    SinkOutcome::Written(n)
                }
                Err(e) => {
                    tracing::error!(device = device_name, error = %e, "batch insert failed");
                    SinkOutcome::Failed(e.to_string())
                }
            }
        };

        let mut sent = 0;
        let mut failed_sends = 0;
        if !output.messages.is_empty() {
            tracing::info!(
                device = device_name,
                count = output.messages.len(),
                "sending SMS messages"
            );
        }
        for msg in &output.messages {
            self.pace();
            if self.sinks.notifier.send(msg).is_delivered() {
                sent += 1;
            } else {
                failed_sends += 1;
            }
        }

        BatchReport {
            output,
            sheet,
            store,
            sent,
            failed_sends,
        }
    }

    pub fn process(&self, events: &[RawEvent], device_name: &str) -> BatchReport {
        tracing::info!(
            device = device_name,
            size = events.len(),
            "processing batch"
        );
        let output = self.prepare(events, device_name);
        self.deliver(output, device_name)
    }
}
