//! S3 and S3-compatible object storage

use super::{deliver, derived_object_name, object_key, ObjectLocation, UploadTarget};
use crate::artifact::Artifact;
use crate::config::{target_keys, TargetSpec};
use crate::error::{Result, WorkerError};
use crate::secrets::{fields, CredentialResolver};
use async_trait::async_trait;
use chrono::Utc;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use secrecy::{ExposeSecret, SecretString};

pub const TARGET_KEY: &str = "s3";

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Default)]
pub struct S3Target;

impl S3Target {
    pub fn new() -> Self {
        Self
    }
}

/// Build an S3 client for one target
pub fn build_store(
    target: &TargetSpec,
    access_key: &SecretString,
    secret_key: &SecretString,
) -> Result<AmazonS3> {
    let bucket = target.require(target_keys::BUCKET_NAME)?;
    let region = target.get(target_keys::AWS_REGION).unwrap_or(DEFAULT_REGION);

    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(bucket)
        .with_region(region)
        .with_access_key_id(access_key.expose_secret())
        .with_secret_access_key(secret_key.expose_secret());

    // Custom endpoints (MinIO, Spaces, ...) need path-style requests
    if let Some(endpoint) = target.get(target_keys::ENDPOINT) {
        builder = builder
            .with_endpoint(endpoint)
            .with_virtual_hosted_style_request(false);
        if endpoint.starts_with("http://") {
            builder = builder.with_allow_http(true);
        }
    }

    builder
        .build()
        .map_err(|e| WorkerError::upload_failed(format!("S3 client for bucket {}: {}", bucket, e)))
}

#[async_trait]
impl UploadTarget for S3Target {
    async fn upload(
        &self,
        target: &TargetSpec,
        artifact: &Artifact,
        resolver: &CredentialResolver,
    ) -> Result<ObjectLocation> {
        let bucket = target.require(target_keys::BUCKET_NAME)?;
        let secret_name = target.require(target_keys::SECRET_NAME)?;

        let credentials = resolver
            .resolve_fields(secret_name, &[fields::ACCESS_KEY, fields::SECRET_KEY])
            .await?;
        let store = build_store(target, &credentials[0], &credentials[1])?;

        let key = object_key(
            target.key_prefix(),
            &derived_object_name(&artifact.path, Utc::now().timestamp()),
        );
        deliver(&store, TARGET_KEY, bucket, &key, artifact).await
    }

    fn backend(&self) -> &'static str {
        "s3"
    }
}
