//! Scan cycle orchestration and scheduling.

pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::{ScanError, ScanOrchestrator, ScanReport};
pub use scheduler::{InvalidSchedule, ScanScheduler, ScanSchedulerHandle, HOURLY};
