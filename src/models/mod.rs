pub mod action;
pub mod raw_event;
pub mod record;
pub mod user;
pub mod watermark;

pub use action::Action;
pub use raw_event::RawEvent;
pub use record::{AttendanceRecord, NotificationMessage};
pub use user::UserDetail;
pub use watermark::Watermark;
