//! Backup Worker Library
//!
//! One-shot database backup: dump a database with its native tool, then
//! upload the dump to every configured storage target.

pub mod artifact;
pub mod config;
pub mod error;
pub mod managers;
pub mod providers;
pub mod secrets;
pub mod targets;
pub mod utils;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactGuard, CleanupPolicy};
pub use config::{load_job_spec, load_targets, load_worker_config, JobSpec, TargetSpec, WorkerConfig};
pub use error::{Result, WorkerError};
pub use managers::logging::{init_logging, LogGuard, LoggingConfig};
pub use managers::runner::{JobRunner, RunReport, RunSettings, RunState, TargetOutcome};
pub use providers::{DumpProvider, ProviderRegistry};
pub use secrets::{CredentialResolver, KubeSecretStore, SecretStore};
pub use targets::{ObjectLocation, TargetRegistry, UploadTarget};
