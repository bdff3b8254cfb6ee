use serde::Serialize;

/// Semantic meaning of a device punch.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Action {
    Arrived,
    Departed,
}

/// Device punch code for a check-in.
pub const CHECK_IN_CODE: i32 = 0;
/// Device punch code for a check-out.
pub const CHECK_OUT_CODE: i32 = 1;

impl Action {
    /// Map a raw device action code. Any code other than check-in/check-out
    /// yields `None`, which callers treat as "log and skip".
    pub fn classify(code: i32) -> Option<Self> {
        match code {
            CHECK_IN_CODE => Some(Self::Arrived),
            CHECK_OUT_CODE => Some(Self::Departed),
            _ => None,
        }
    }

    /// Phrase used in the spreadsheet, the store and the SMS body.
    pub fn describe(&self) -> &'static str {
        match self {
            Action::Arrived => "has reported back to school",
            Action::Departed => "has left the school",
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        self.describe()
    }

    /// Convert DB string → enum (accepts the phrase or the short form)
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "has reported back to school" | "arrived" => Some(Action::Arrived),
            "has left the school" | "departed" => Some(Action::Departed),
            _ => None,
        }
    }
}
