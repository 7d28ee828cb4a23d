//! Upload targets - one per storage backend
//!
//! Each target delivers the run's [`Artifact`] to one destination. All
//! backends go through `object_store`, so naming and streaming are shared
//! here and the backend modules only build a store from the target spec.

pub mod gcs;
pub mod local;
pub mod s3;

use crate::artifact::Artifact;
use crate::config::{ConfigError, TargetSpec};
use crate::error::{Result, WorkerError};
use crate::secrets::CredentialResolver;
use async_trait::async_trait;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, WriteMultipart};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

pub use gcs::GcsTarget;
pub use local::LocalTarget;
pub use s3::S3Target;

/// Read buffer size when streaming the artifact
const CHUNK_SIZE: usize = 1024 * 1024;

/// Parts allowed in flight per upload
const MAX_PARTS_IN_FLIGHT: usize = 4;

/// Where an artifact ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub backend: String,
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(backend: &str, bucket: &str, key: &str) -> Self {
        Self {
            backend: backend.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.backend, self.bucket, self.key)
    }
}

/// Trait for upload backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadTarget: Send + Sync {
    /// Upload the artifact to the destination described by `target`
    async fn upload(
        &self,
        target: &TargetSpec,
        artifact: &Artifact,
        resolver: &CredentialResolver,
    ) -> Result<ObjectLocation>;

    /// Backend name (for logging)
    fn backend(&self) -> &'static str;
}

/// Object name for an artifact: base file name up to the first `.`,
/// then `_<unix seconds>.sql`
pub fn derived_object_name(artifact_path: &Path, unix_seconds: i64) -> String {
    let base = artifact_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = base.split('.').next().unwrap_or_default();
    format!("{}_{}.sql", stem, unix_seconds)
}

/// Join a key prefix and an object name with exactly one `/`
pub fn object_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Stream the artifact into `store` under `key`, then report its location
pub async fn deliver(
    store: &dyn ObjectStore,
    backend: &str,
    bucket: &str,
    key: &str,
    artifact: &Artifact,
) -> Result<ObjectLocation> {
    let mut file = tokio::fs::File::open(&artifact.path)
        .await
        .map_err(|source| WorkerError::ArtifactUnreadable {
            path: artifact.path.clone(),
            source,
        })?;

    let location = ObjectPath::parse(key)
        .map_err(|e| WorkerError::upload_failed(format!("invalid object key '{}': {}", key, e)))?;

    debug!("Opening upload to {}://{}/{}", backend, bucket, key);
    let upload = store.put_multipart(&location).await?;
    let mut writer = WriteMultipart::new(upload);

    if let Err(e) = stream_file(&mut file, &mut writer, artifact).await {
        if let Err(abort_err) = writer.abort().await {
            warn!("Failed to abort upload of {}: {}", key, abort_err);
        }
        return Err(e);
    }

    writer.finish().await?;

    let location = ObjectLocation::new(backend, bucket, key);
    info!("File {} uploaded to {}", artifact.file_name(), location);
    Ok(location)
}

async fn stream_file(
    file: &mut tokio::fs::File,
    writer: &mut WriteMultipart,
    artifact: &Artifact,
) -> Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|source| WorkerError::ArtifactUnreadable {
                path: artifact.path.clone(),
                source,
            })?;
        if n == 0 {
            return Ok(());
        }
        writer.wait_for_capacity(MAX_PARTS_IN_FLIGHT).await?;
        writer.write(&buf[..n]);
    }
}

/// Selector string -> target
#[derive(Clone, Default)]
pub struct TargetRegistry {
    targets: BTreeMap<String, Arc<dyn UploadTarget>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in backends
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(s3::TARGET_KEY, Arc::new(S3Target::new()));
        registry.register(gcs::TARGET_KEY, Arc::new(GcsTarget::new()));
        registry.register(local::TARGET_KEY, Arc::new(LocalTarget::new()));
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, target: Arc<dyn UploadTarget>) {
        self.targets.insert(key.into(), target);
    }

    pub fn get(&self, key: &str) -> std::result::Result<Arc<dyn UploadTarget>, ConfigError> {
        self.targets
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownTargetType(key.to_string()))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }
}
