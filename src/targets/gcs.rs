//! Google Cloud Storage

use super::{deliver, derived_object_name, object_key, ObjectLocation, UploadTarget};
use crate::artifact::Artifact;
use crate::config::{target_keys, TargetSpec};
use crate::error::{Result, WorkerError};
use crate::secrets::{fields, CredentialResolver};
use async_trait::async_trait;
use chrono::Utc;
use object_store::gcp::GoogleCloudStorageBuilder;
use secrecy::ExposeSecret;

pub const TARGET_KEY: &str = "gcs";

#[derive(Debug, Default)]
pub struct GcsTarget;

impl GcsTarget {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UploadTarget for GcsTarget {
    async fn upload(
        &self,
        target: &TargetSpec,
        artifact: &Artifact,
        resolver: &CredentialResolver,
    ) -> Result<ObjectLocation> {
        let bucket = target.require(target_keys::BUCKET_NAME)?;
        let service_account_key = resolver
            .resolve(&target.credential()?, fields::JSON_KEY)
            .await?;

        // Key material is handed over in memory; nothing lands on disk
        let store = GoogleCloudStorageBuilder::new()
            .with_bucket_name(bucket)
            .with_service_account_key(service_account_key.expose_secret())
            .build()
            .map_err(|e| {
                WorkerError::upload_failed(format!("GCS client for bucket {}: {}", bucket, e))
            })?;

        let key = object_key(
            target.key_prefix(),
            &derived_object_name(&artifact.path, Utc::now().timestamp()),
        );
        deliver(&store, TARGET_KEY, bucket, &key, artifact).await
    }

    fn backend(&self) -> &'static str {
        "gcs"
    }
}
