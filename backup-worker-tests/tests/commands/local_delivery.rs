//! End-to-end runs through the real postgres provider and local target
//!
//! Only `pg_dump` and the secret store are doubles.

use backup_worker::providers::ProviderRegistry;
use backup_worker::targets::TargetRegistry;
use std::sync::Arc;
use test_utils::*;

fn pg_dump_writing_sample() -> MockExecutor {
    MockExecutor::new().expect(
        "pg_dump",
        MockResponse::WriteOutput {
            contents: sample_dump().to_string(),
        },
    )
}

#[tokio::test]
async fn test_dump_lands_in_local_directory() {
    let ctx = TestContext::new();
    let out = ctx.create_subdir("out");
    let store = store_with_db_password("orders-db", "hunter2");
    let providers = ProviderRegistry::with_defaults(Arc::new(pg_dump_writing_sample()));

    let mut runner = ctx.runner(
        providers,
        TargetRegistry::with_defaults(),
        Arc::new(store.clone()),
        CleanupPolicy::Remove,
    );
    let report = runner
        .run(
            &JobSpecBuilder::postgres()
                .without("dbPassword")
                .password_secret("orders-db")
                .database("orders")
                .build(),
            &[TargetSpecBuilder::local(&out).prefix("pg/").build()],
        )
        .await
        .unwrap();

    assert!(report.succeeded());
    let location = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(location.backend, "local");
    assert!(location.key.starts_with("pg/orders_"));
    assert!(location.key.ends_with(".sql"));

    let stored = std::fs::read_to_string(out.join(&location.key)).unwrap();
    assert_eq!(stored, sample_dump());
    assert_eq!(store.call_count(), 1);
    assert!(ctx.work_dir_entries().is_empty());
}

#[tokio::test]
async fn test_no_targets_keeps_the_dump() {
    let ctx = TestContext::new();
    let providers = ProviderRegistry::with_defaults(Arc::new(pg_dump_writing_sample()));

    let mut runner = ctx.runner(
        providers,
        TargetRegistry::with_defaults(),
        Arc::new(MockSecretStore::new()),
        CleanupPolicy::Remove,
    );
    let report = runner.run(&JobSpecBuilder::postgres().build(), &[]).await.unwrap();

    assert!(report.succeeded());
    assert!(report.outcomes.is_empty());
    assert_eq!(ctx.work_dir_entries(), vec![report.artifact.path.clone()]);
}

#[tokio::test]
async fn test_s3_target_without_secret_fails_alone() {
    let ctx = TestContext::new();
    let out = ctx.create_subdir("out");
    let providers = ProviderRegistry::with_defaults(Arc::new(pg_dump_writing_sample()));

    let mut runner = ctx.runner(
        providers,
        TargetRegistry::with_defaults(),
        Arc::new(MockSecretStore::new()),
        CleanupPolicy::Remove,
    );
    let report = runner
        .run(
            &JobSpecBuilder::postgres().build(),
            &[
                TargetSpecBuilder::s3("backups", "missing-creds").build(),
                TargetSpecBuilder::local(&out).build(),
            ],
        )
        .await
        .unwrap();

    assert!(!report.succeeded());
    assert!(report.outcomes[0].result.is_err());
    assert!(report.outcomes[1].is_success());
}
