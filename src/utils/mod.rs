pub mod colors;
pub mod instance_lock;
pub mod lock;
pub mod logging;
pub mod path;
