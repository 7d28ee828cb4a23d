//! Common utilities for integration tests

use backup_worker::managers::runner::{JobRunner, RunSettings};
use backup_worker::providers::ProviderRegistry;
use backup_worker::secrets::CredentialResolver;
use backup_worker::targets::TargetRegistry;
use backup_worker::utils::RealExecutor;
use std::process::Command;
use std::sync::Arc;
use test_utils::{CleanupPolicy, MockSecretStore, TestContext, TEST_NAMESPACE};

/// Helper to check if Docker is available
pub fn is_docker_available() -> bool {
    Command::new("docker")
        .args(["ps"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Docker and the client tool are both needed
pub fn can_run(tool: &str) -> bool {
    if !is_docker_available() {
        println!("Skipping: Docker not available");
        return false;
    }
    if which::which(tool).is_err() {
        println!("Skipping: {} not on PATH", tool);
        return false;
    }
    true
}

/// Runner with the real dump tools and the built-in targets
pub fn real_runner(ctx: &TestContext, store: MockSecretStore) -> JobRunner {
    let resolver = Arc::new(CredentialResolver::new(Arc::new(store), TEST_NAMESPACE));
    JobRunner::new(
        ProviderRegistry::with_defaults(Arc::new(RealExecutor::new())),
        TargetRegistry::with_defaults(),
        resolver,
        RunSettings {
            work_dir: ctx.work_dir(),
            cleanup: CleanupPolicy::Remove,
            upload_concurrency: 2,
            dump_timeout: Some(std::time::Duration::from_secs(120)),
        },
    )
}
