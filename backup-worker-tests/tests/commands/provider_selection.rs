//! Tests for choosing the dump provider from the job spec

use backup_worker::config::ConfigError;
use backup_worker::error::WorkerError;
use backup_worker::providers::ProviderRegistry;
use backup_worker::targets::TargetRegistry;
use std::sync::Arc;
use test_utils::*;

#[tokio::test]
async fn test_unknown_provider_never_invokes_a_dump_tool() {
    let ctx = TestContext::new();
    let executor = MockExecutor::new();
    let store = MockSecretStore::new();
    let providers = ProviderRegistry::with_defaults(Arc::new(executor.clone()));

    let mut runner = ctx.runner(
        providers,
        TargetRegistry::with_defaults(),
        Arc::new(store.clone()),
        CleanupPolicy::Remove,
    );
    let err = runner
        .run(
            &JobSpecBuilder::postgres().provider("oracle.exp").build(),
            &[TargetSpecBuilder::local(ctx.create_subdir("out")).build()],
        )
        .await
        .unwrap_err();

    match err {
        WorkerError::Configuration(ConfigError::UnknownProvider(name)) => {
            assert_eq!(name, "oracle.exp")
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(executor.call_count(), 0);
    assert_eq!(store.call_count(), 0);
    assert_eq!(runner.state(), RunState::Failed);
}

#[tokio::test]
async fn test_missing_provider_field() {
    let ctx = TestContext::new();
    let executor = MockExecutor::new();
    let providers = ProviderRegistry::with_defaults(Arc::new(executor.clone()));

    let mut runner = ctx.runner(
        providers,
        TargetRegistry::new(),
        Arc::new(MockSecretStore::new()),
        CleanupPolicy::Remove,
    );
    let result = runner
        .run(&JobSpecBuilder::postgres().without("provider").build(), &[])
        .await;

    result.assert_err_contains("provider");
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_builtin_providers_are_registered() {
    let registry = ProviderRegistry::with_defaults(Arc::new(MockExecutor::new()));
    assert_eq!(registry.keys(), vec!["mysql.mysqldump", "postgres.pg_dump"]);
}
