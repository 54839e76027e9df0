//! Install / activate / fetch lifecycle for one cache generation

pub mod manager;
pub mod record;
pub mod state;

pub use manager::{FetchOutcome, FetchSource, InstallReport, OfflineCacheManager, SweepReport};
pub use record::{WorkerRecord, WorkerRegistry};
pub use state::{Trigger, WorkerState};
