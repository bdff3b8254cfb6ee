use chrono::NaiveDateTime;
use serde::Serialize;

/// One punch as read from the device log. Device order is not trusted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RawEvent {
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    pub action_code: i32,
}

impl RawEvent {
    pub fn new(user_id: impl Into<String>, timestamp: NaiveDateTime, action_code: i32) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            action_code,
        }
    }
}
