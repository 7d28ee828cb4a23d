//! Tests for uploading one dump to several targets
//!
//! Every target is attempted, in order, whatever happened to the others.

use backup_worker::config::{load_job_spec, load_targets, ConfigError};
use backup_worker::error::WorkerError;
use backup_worker::providers::ProviderRegistry;
use backup_worker::targets::TargetRegistry;
use std::sync::Arc;
use test_utils::*;

fn registries(
    provider: &StaticProvider,
    target: &RecordingTarget,
) -> (ProviderRegistry, TargetRegistry) {
    let mut providers = ProviderRegistry::new();
    providers.register("postgres.pg_dump", Arc::new(provider.clone()));
    let mut targets = TargetRegistry::new();
    targets.register("s3", Arc::new(target.clone()));
    (providers, targets)
}

#[tokio::test]
async fn test_first_target_fails_second_still_runs() {
    let ctx = TestContext::new();
    let provider = StaticProvider::new(sample_dump());
    let target = RecordingTarget::new().fail_bucket("first");
    let (providers, targets) = registries(&provider, &target);

    let job_path = ctx.write_job_spec(&JobSpecBuilder::postgres().build());
    let targets_path = ctx.write_targets(&[
        TargetSpecBuilder::s3("first", "creds").build(),
        TargetSpecBuilder::s3("second", "creds").build(),
    ]);

    let mut runner = ctx.runner(providers, targets, Arc::new(MockSecretStore::new()), CleanupPolicy::Remove);
    let report = runner
        .run(
            &load_job_spec(job_path).unwrap(),
            &load_targets(targets_path).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(target.attempted_labels().len(), 2);
    assert!(!report.succeeded());
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.outcomes[0].label, "s3:first");
    assert!(report.outcomes[1].is_success());
    assert_eq!(runner.state(), RunState::Done);
}

#[tokio::test]
async fn test_outcomes_follow_target_order() {
    let ctx = TestContext::new();
    let provider = StaticProvider::new(sample_dump());
    let target = RecordingTarget::new();
    let (providers, targets) = registries(&provider, &target);
    let specs: Vec<TargetSpec> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|bucket| TargetSpecBuilder::s3(bucket, "creds").prefix("nightly/").build())
        .collect();

    let mut runner = ctx.runner(providers, targets, Arc::new(MockSecretStore::new()), CleanupPolicy::Remove);
    let report = runner.run(&JobSpecBuilder::postgres().build(), &specs).await.unwrap();

    let labels: Vec<_> = report.outcomes.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["s3:a", "s3:b", "s3:c", "s3:d", "s3:e"]);
    assert!(report.succeeded());
    for upload in target.uploads() {
        assert!(upload.key.starts_with("nightly/testdb_"));
        assert_eq!(upload.contents, sample_dump());
    }
}

#[tokio::test]
async fn test_unknown_target_type_fails_only_that_target() {
    let ctx = TestContext::new();
    let provider = StaticProvider::new(sample_dump());
    let target = RecordingTarget::new();
    let (providers, targets) = registries(&provider, &target);

    let mut runner = ctx.runner(providers, targets, Arc::new(MockSecretStore::new()), CleanupPolicy::Remove);
    let report = runner
        .run(
            &JobSpecBuilder::postgres().build(),
            &[
                TargetSpecBuilder::of_type("ftp").bucket("x").build(),
                TargetSpecBuilder::s3("ok", "creds").build(),
            ],
        )
        .await
        .unwrap();

    assert!(matches!(
        report.outcomes[0].result,
        Err(WorkerError::Configuration(ConfigError::UnknownTargetType(_)))
    ));
    assert!(report.outcomes[1].is_success());
    assert_eq!(target.attempted_labels(), vec!["s3:ok".to_string()]);
}

#[tokio::test]
async fn test_dump_failure_means_no_uploads() {
    let ctx = TestContext::new();
    let provider = StaticProvider::failing("server closed the connection");
    let target = RecordingTarget::new();
    let (providers, targets) = registries(&provider, &target);

    let mut runner = ctx.runner(providers, targets, Arc::new(MockSecretStore::new()), CleanupPolicy::Remove);
    let result = runner
        .run(
            &JobSpecBuilder::postgres().build(),
            &[TargetSpecBuilder::s3("a", "creds").build()],
        )
        .await;

    result.assert_err_contains("server closed the connection");
    assert!(target.uploads().is_empty());
    assert_eq!(runner.state(), RunState::Failed);
}

#[tokio::test]
async fn test_artifact_cleanup_policy() {
    let ctx = TestContext::new();
    let provider = StaticProvider::new(sample_dump());
    let target = RecordingTarget::new();

    let (providers, targets) = registries(&provider, &target);
    let mut runner = ctx.runner(providers, targets, Arc::new(MockSecretStore::new()), CleanupPolicy::Keep);
    let report = runner
        .run(
            &JobSpecBuilder::postgres().build(),
            &[TargetSpecBuilder::s3("a", "creds").build()],
        )
        .await
        .unwrap();
    assert!(report.artifact.path.exists());

    std::fs::remove_file(&report.artifact.path).unwrap();

    let (providers, targets) = registries(&provider, &target);
    let mut runner = ctx.runner(providers, targets, Arc::new(MockSecretStore::new()), CleanupPolicy::Remove);
    let report = runner
        .run(
            &JobSpecBuilder::postgres().build(),
            &[TargetSpecBuilder::s3("a", "creds").build()],
        )
        .await
        .unwrap();
    assert!(!report.artifact.path.exists());
    assert!(ctx.work_dir_entries().is_empty());
}
