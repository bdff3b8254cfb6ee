pub mod batch;
pub mod ports;
pub mod shutdown;
pub mod sync;

pub use batch::{BatchOutput, BatchProcessor, BatchReport, SinkOutcome, Sinks};
pub use shutdown::Shutdown;
pub use sync::{CycleReport, SyncDriver, SyncSettings, SyncState};
