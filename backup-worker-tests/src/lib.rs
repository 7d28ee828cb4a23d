//! Test utilities for backup-worker
//!
//! This crate provides shared test utilities, test doubles,
//! and helper functions for testing the backup worker.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{JobSpecBuilder, TargetSpecBuilder, TestContext};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let ctx = TestContext::new();
//!     let job = JobSpecBuilder::postgres().database("orders").build();
//!     let target = TargetSpecBuilder::local(ctx.create_subdir("out")).build();
//!     // ... test code
//! }
//! ```

pub mod doubles;
pub mod fixtures;
pub mod spec_builder;
pub mod test_context;

// Re-export commonly used items
pub use doubles::{RecordingTarget, StaticProvider};
pub use fixtures::*;
pub use spec_builder::{JobSpecBuilder, TargetSpecBuilder};
pub use test_context::{OptionAssertions, ResultAssertions, TestContext};

// Re-export types from the main crate for convenience
pub use backup_worker::artifact::{Artifact, CleanupPolicy};
pub use backup_worker::config::{JobSpec, TargetSpec};
pub use backup_worker::managers::runner::{JobRunner, RunReport, RunSettings, RunState};
pub use backup_worker::secrets::CredentialResolver;

// Re-export mock implementations from the main crate
pub use backup_worker::secrets::mock::MockSecretStore;
pub use backup_worker::utils::executor::mock::{MockExecutor, MockResponse};
pub use backup_worker::utils::executor::CommandExecutor;

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;
