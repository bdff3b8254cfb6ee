use super::action::Action;
use super::user::UserDetail;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Human display form, e.g. `06-05-2024 07:58 AM`.
pub const DISPLAY_FORMAT: &str = "%d-%m-%Y %I:%M %p";
/// Canonical storage form, e.g. `2024-05-06 07:58:12`.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Spreadsheet header row.
pub const SHEET_HEADERS: [&str; 6] = [
    "Device",
    "User ID",
    "Admission No",
    "Name",
    "Action",
    "Timestamp",
];

pub fn display_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

pub fn storage_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(STORAGE_FORMAT).to_string()
}

pub fn parse_storage_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), STORAGE_FORMAT).ok()
}

/// A resolved and classified punch, written once to each sink.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub user_id: String,
    pub user_name: String,
    pub action: Action,
    pub timestamp: NaiveDateTime,
    pub device_name: String,
}

impl AttendanceRecord {
    pub fn new(
        user: &UserDetail,
        action: Action,
        timestamp: NaiveDateTime,
        device_name: &str,
    ) -> Self {
        Self {
            user_id: user.user_id.clone(),
            user_name: user.display_name(),
            action,
            timestamp,
            device_name: device_name.to_string(),
        }
    }

    pub fn display_timestamp(&self) -> String {
        display_timestamp(&self.timestamp)
    }

    pub fn storage_timestamp(&self) -> String {
        storage_timestamp(&self.timestamp)
    }

    /// Row in [`SHEET_HEADERS`] order. The admission number is the user id.
    pub fn sheet_row(&self) -> [String; 6] {
        [
            self.device_name.clone(),
            self.user_id.clone(),
            self.user_id.clone(),
            self.user_name.clone(),
            self.action.describe().to_string(),
            self.display_timestamp(),
        ]
    }
}

/// SMS body and recipient derived from one record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationMessage {
    pub recipient_phone: String,
    pub body: String,
}

impl NotificationMessage {
    /// Render `template` for `record`.
    ///
    /// Placeholders: `{name}`, `{id}`, `{action}`, `{time}`.
    pub fn render(template: &str, record: &AttendanceRecord, phone: &str) -> Self {
        let body = template
            .replace("{name}", &record.user_name)
            .replace("{id}", &record.user_id)
            .replace("{action}", record.action.describe())
            .replace("{time}", &record.display_timestamp());
        Self {
            recipient_phone: phone.to_string(),
            body,
        }
    }
}
