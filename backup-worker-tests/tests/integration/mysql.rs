//! MySQL integration tests

use crate::common::{can_run, real_runner};
use testcontainers::clients::Cli;
use testcontainers_modules::mysql::Mysql;
use test_utils::*;

#[tokio::test]
#[ignore]
async fn test_mysql_dump_to_local_target() {
    if !can_run("mysqldump") {
        return;
    }

    let docker = Cli::default();
    let node = docker.run(Mysql::default());
    let port = node.get_host_port_ipv4(3306);

    let ctx = TestContext::new();
    let out = ctx.create_subdir("out");
    // The module image allows an empty root password
    let job = JobSpecBuilder::mysql()
        .host("127.0.0.1")
        .port(port)
        .username("root")
        .database("test")
        .password("")
        .build();

    let mut runner = real_runner(&ctx, MockSecretStore::new());
    let report = runner
        .run(&job, &[TargetSpecBuilder::local(&out).build()])
        .await
        .assert_ok();

    assert!(report.succeeded());
    let location = report.outcomes[0].result.as_ref().unwrap();
    assert!(location.key.starts_with("test_"));
    assert!(out.join(&location.key).exists());
}
