//! Local filesystem destination (mounted volumes, tests)

use super::{deliver, derived_object_name, object_key, ObjectLocation, UploadTarget};
use crate::artifact::Artifact;
use crate::config::{expand_tilde, target_keys, TargetSpec};
use crate::error::{Result, WorkerError};
use crate::secrets::CredentialResolver;
use async_trait::async_trait;
use chrono::Utc;
use object_store::local::LocalFileSystem;
use std::path::Path;

pub const TARGET_KEY: &str = "local";

#[derive(Debug, Default)]
pub struct LocalTarget;

impl LocalTarget {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UploadTarget for LocalTarget {
    async fn upload(
        &self,
        target: &TargetSpec,
        artifact: &Artifact,
        _resolver: &CredentialResolver,
    ) -> Result<ObjectLocation> {
        let directory = target.require(target_keys::DIRECTORY)?;
        let root = expand_tilde(Path::new(directory));

        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            WorkerError::upload_failed(format!("failed to create {}: {}", root.display(), e))
        })?;
        let store = LocalFileSystem::new_with_prefix(&root)?;

        let key = object_key(
            target.key_prefix(),
            &derived_object_name(&artifact.path, Utc::now().timestamp()),
        );
        deliver(&store, TARGET_KEY, directory, &key, artifact).await
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
