//! Port interfaces the sync pipeline writes to.
//!
//! The pipeline only sees these traits; `db`, `sheet` and `notify` provide
//! the production adapters and tests swap in fakes.

use crate::errors::AppResult;
use crate::models::{AttendanceRecord, NotificationMessage, Watermark};
use chrono::NaiveDateTime;

/// Append-only spreadsheet log, one file per device.
pub trait SheetSink: Send + Sync {
    /// Append `records` as rows for `device_name`; returns rows written.
    fn append_rows(&self, device_name: &str, records: &[AttendanceRecord]) -> AppResult<usize>;
}

/// Durable attendance store, also the source of truth for watermarks.
pub trait RecordStore: Send + Sync {
    /// Last synced timestamp for `device_name`, `None` if never synced.
    fn load_watermark(&self, device_name: &str) -> AppResult<Option<NaiveDateTime>>;

    /// Insert all `records` in one batched write; returns rows inserted.
    fn insert_records(&self, records: &[AttendanceRecord]) -> AppResult<usize>;

    /// Persist `watermark`. Implementations must never move it backwards.
    fn save_watermark(&self, watermark: &Watermark) -> AppResult<()>;
}

/// Outcome of one notification send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Provider answered with a 2xx status.
    Delivered(u16),
    /// Provider answered with a non-2xx status.
    Rejected(u16),
    /// Transport failure (timeout, connection refused, TLS, ...).
    Failed(String),
    /// Recipient was blank; nothing was sent.
    InvalidRecipient,
}

impl DeliveryStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered(_))
    }
}

/// Delivers one message to one recipient. Never returns an error: failures
/// are logged, audited and reported through [`DeliveryStatus`].
pub trait Notifier: Send + Sync {
    fn send(&self, message: &NotificationMessage) -> DeliveryStatus;
}

/// One audited notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAttempt {
    pub recipient: String,
    pub message: String,
    pub http_status: Option<u16>,
    pub response: String,
    pub outcome: &'static str,
    pub attempted_at: NaiveDateTime,
}

/// Audit trail for notification attempts.
pub trait AuditLog: Send + Sync {
    fn record_delivery(&self, attempt: &DeliveryAttempt) -> AppResult<()>;
}
