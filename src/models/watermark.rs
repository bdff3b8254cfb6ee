use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Last synced punch time for one device.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Watermark {
    pub device_name: String,
    pub last_timestamp: NaiveDateTime,
}

/// Watermark used when a device has never been synced: process all history.
pub fn default_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

impl Watermark {
    pub fn new(device_name: impl Into<String>, last_timestamp: NaiveDateTime) -> Self {
        Self {
            device_name: device_name.into(),
            last_timestamp,
        }
    }

    pub fn initial(device_name: impl Into<String>) -> Self {
        Self::new(device_name, default_epoch())
    }

    /// Move forward to `ts`. Never moves backwards; returns whether it moved.
    pub fn advance(&mut self, ts: NaiveDateTime) -> bool {
        if ts > self.last_timestamp {
            self.last_timestamp = ts;
            true
        } else {
            false
        }
    }

    /// Events strictly newer than the watermark are still pending.
    pub fn admits(&self, ts: NaiveDateTime) -> bool {
        ts > self.last_timestamp
    }
}
