//! Run orchestration and process-level services

pub mod logging;
pub mod runner;

pub use logging::{init_logging, LogGuard, LoggingConfig};
pub use runner::{JobRunner, RunReport, RunSettings, RunState, TargetOutcome};
