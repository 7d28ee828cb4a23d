//! PostgreSQL integration tests
//!
//! Dump a throwaway container with the host's `pg_dump` and deliver it to
//! a local directory.

use crate::common::{can_run, real_runner};
use testcontainers::clients::Cli;
use testcontainers_modules::postgres::Postgres;
use test_utils::*;

#[tokio::test]
#[ignore]
async fn test_postgres_dump_to_local_target() {
    if !can_run("pg_dump") {
        return;
    }

    let docker = Cli::default();
    let node = docker.run(Postgres::default());
    let port = node.get_host_port_ipv4(5432);

    let ctx = TestContext::new();
    let out = ctx.create_subdir("out");
    let store = store_with_db_password("pg-secret", "postgres");
    let job = JobSpecBuilder::postgres()
        .host("127.0.0.1")
        .port(port)
        .username("postgres")
        .database("postgres")
        .without("dbPassword")
        .password_secret("pg-secret")
        .build();

    let mut runner = real_runner(&ctx, store);
    let report = runner
        .run(&job, &[TargetSpecBuilder::local(&out).prefix("pg").build()])
        .await
        .assert_ok();

    assert!(report.succeeded());
    let location = report.outcomes[0].result.as_ref().unwrap();
    let dump = std::fs::read_to_string(out.join(&location.key)).unwrap();
    assert!(dump.contains("PostgreSQL database dump"));
}

#[tokio::test]
#[ignore]
async fn test_postgres_wrong_password_is_dump_failure() {
    if !can_run("pg_dump") {
        return;
    }

    let docker = Cli::default();
    let node = docker.run(Postgres::default());
    let port = node.get_host_port_ipv4(5432);

    let ctx = TestContext::new();
    let job = JobSpecBuilder::postgres()
        .host("127.0.0.1")
        .port(port)
        .username("nobody")
        .database("postgres")
        .password("wrong")
        .build();

    let mut runner = real_runner(&ctx, MockSecretStore::new());
    let result = runner.run(&job, &[]).await;

    result.assert_err_contains("Dump failed");
    assert_eq!(runner.state(), RunState::Failed);
}
