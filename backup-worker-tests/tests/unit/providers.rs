//! Tests for the dump providers with a mocked executor

use backup_worker::config::ConfigError;
use backup_worker::error::WorkerError;
use backup_worker::providers::{DumpContext, DumpProvider, MysqlProvider, PostgresProvider};
use std::sync::Arc;
use test_utils::*;

fn context(ctx: &TestContext, store: MockSecretStore) -> DumpContext {
    DumpContext {
        resolver: Arc::new(CredentialResolver::new(Arc::new(store), TEST_NAMESPACE)),
        work_dir: ctx.create_subdir("work"),
        timeout: None,
    }
}

#[tokio::test]
async fn test_pg_dump_gets_password_from_secret() {
    let ctx = TestContext::new();
    let executor = MockExecutor::new().expect(
        "pg_dump",
        MockResponse::WriteOutput {
            contents: sample_dump().to_string(),
        },
    );
    let provider = PostgresProvider::new(Arc::new(executor.clone()));
    let job = JobSpecBuilder::postgres()
        .without("dbPassword")
        .password_secret("orders-db")
        .database("orders")
        .build();

    let artifact = provider
        .dump(&job, &context(&ctx, store_with_db_password("orders-db", " s3cr3t\n")))
        .await
        .unwrap();

    assert_eq!(artifact.database, "orders");
    assert_eq!(artifact.size_bytes, sample_dump().len() as u64);
    assert!(artifact.file_name().starts_with("orders_"));

    let calls = executor.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].env.get("PGPASSWORD").map(String::as_str), Some("s3cr3t"));
    assert!(calls[0].args.iter().all(|a| !a.contains("s3cr3t")));
    assert!(calls[0].args.contains(&"--dbname=orders".to_string()));
}

#[tokio::test]
async fn test_mysqldump_uses_overlay() {
    let ctx = TestContext::new();
    let executor = MockExecutor::new().expect(
        "mysqldump",
        MockResponse::WriteOutput {
            contents: "-- MySQL dump".to_string(),
        },
    );
    let provider = MysqlProvider::new(Arc::new(executor.clone()));
    let job = JobSpecBuilder::mysql().database("shop").build();

    provider
        .dump(&job, &context(&ctx, MockSecretStore::new()))
        .await
        .unwrap();

    let call = &executor.get_calls()[0];
    assert_eq!(call.program, "mysqldump");
    assert_eq!(call.env.get("MYSQL_PWD").map(String::as_str), Some("testpass"));
    assert_eq!(call.args.last().map(String::as_str), Some("shop"));
}

#[tokio::test]
async fn test_failed_dump_tool_is_dump_failed() {
    let ctx = TestContext::new();
    let executor = MockExecutor::new().expect(
        "pg_dump",
        MockResponse::Failure {
            stderr: "connection refused".to_string(),
            exit_code: 1,
        },
    );
    let provider = PostgresProvider::new(Arc::new(executor));

    let err = provider
        .dump(&JobSpecBuilder::postgres().build(), &context(&ctx, MockSecretStore::new()))
        .await
        .unwrap_err();

    match err {
        WorkerError::DumpFailed { cause } => assert!(cause.contains("connection refused")),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_invalid_port_never_runs_tool() {
    let ctx = TestContext::new();
    let store = MockSecretStore::new();
    let executor = MockExecutor::new();
    let provider = PostgresProvider::new(Arc::new(executor.clone()));
    let job = JobSpecBuilder::postgres().field("dbPort", "fivefour").build();

    let err = provider
        .dump(&job, &context(&ctx, store.clone()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkerError::Configuration(ConfigError::InvalidField { .. })
    ));
    assert_eq!(executor.call_count(), 0);
    assert_eq!(store.call_count(), 0);
}
