//! Recording test doubles for the provider and target seams

use async_trait::async_trait;
use backup_worker::artifact::{artifact_file_name, Artifact};
use backup_worker::config::{job_keys, target_keys, JobSpec, TargetSpec};
use backup_worker::error::{Result, WorkerError};
use backup_worker::providers::{DumpContext, DumpProvider};
use backup_worker::secrets::CredentialResolver;
use backup_worker::targets::{derived_object_name, object_key, ObjectLocation, UploadTarget};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Provider that writes fixed contents instead of running a dump tool
#[derive(Clone)]
pub struct StaticProvider {
    contents: String,
    failure: Option<String>,
    calls: Arc<Mutex<usize>>,
}

impl StaticProvider {
    pub fn new(contents: &str) -> Self {
        Self {
            contents: contents.to_string(),
            failure: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Provider whose dump always fails with `cause`
    pub fn failing(cause: &str) -> Self {
        Self {
            failure: Some(cause.to_string()),
            ..Self::new("")
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl DumpProvider for StaticProvider {
    async fn dump(&self, job: &JobSpec, ctx: &DumpContext) -> Result<Artifact> {
        *self.calls.lock() += 1;
        if let Some(cause) = &self.failure {
            return Err(WorkerError::dump_failed(cause));
        }

        let database = job.require(job_keys::DB_DATABASE)?;
        let created_at = Utc::now();
        let path = ctx.work_dir.join(artifact_file_name(database, created_at));
        tokio::fs::write(&path, &self.contents)
            .await
            .map_err(WorkerError::dump_failed)?;

        Ok(Artifact {
            path,
            database: database.to_string(),
            provider: "static".to_string(),
            created_at,
            size_bytes: self.contents.len() as u64,
        })
    }

    fn engine(&self) -> &'static str {
        "static"
    }
}

/// One upload seen by [`RecordingTarget`]
#[derive(Clone, Debug)]
pub struct RecordedUpload {
    pub label: String,
    pub key: String,
    /// Artifact contents at upload time
    pub contents: String,
}

/// Target that records uploads and fails for selected buckets
#[derive(Clone, Default)]
pub struct RecordingTarget {
    failing_buckets: Arc<Mutex<HashSet<String>>>,
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads to `bucket` fail
    pub fn fail_bucket(self, bucket: &str) -> Self {
        self.failing_buckets.lock().insert(bucket.to_string());
        self
    }

    /// Every attempted upload, failed ones included, in call order
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().clone()
    }

    pub fn attempted_labels(&self) -> Vec<String> {
        self.uploads.lock().iter().map(|u| u.label.clone()).collect()
    }
}

#[async_trait]
impl UploadTarget for RecordingTarget {
    async fn upload(
        &self,
        target: &TargetSpec,
        artifact: &Artifact,
        _resolver: &CredentialResolver,
    ) -> Result<ObjectLocation> {
        let bucket = target.require(target_keys::BUCKET_NAME)?;
        let key = object_key(
            target.key_prefix(),
            &derived_object_name(&artifact.path, Utc::now().timestamp()),
        );
        let contents = tokio::fs::read_to_string(&artifact.path)
            .await
            .map_err(|source| WorkerError::ArtifactUnreadable {
                path: artifact.path.clone(),
                source,
            })?;

        self.uploads.lock().push(RecordedUpload {
            label: target.label(),
            key: key.clone(),
            contents,
        });

        if self.failing_buckets.lock().contains(bucket) {
            return Err(WorkerError::upload_failed(format!("bucket {} rejected the upload", bucket)));
        }
        Ok(ObjectLocation::new("recording", bucket, &key))
    }

    fn backend(&self) -> &'static str {
        "recording"
    }
}
