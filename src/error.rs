//! Error taxonomy for a worker run

use crate::config::ConfigError;
use crate::secrets::CredentialError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Dump failed: {cause}")]
    DumpFailed { cause: String },

    #[error("Upload failed: {cause}")]
    UploadFailed { cause: String },

    #[error("Artifact unreadable: {path}: {source}")]
    ArtifactUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkerError {
    pub fn dump_failed(cause: impl std::fmt::Display) -> Self {
        WorkerError::DumpFailed {
            cause: cause.to_string(),
        }
    }

    pub fn upload_failed(cause: impl std::fmt::Display) -> Self {
        WorkerError::UploadFailed {
            cause: cause.to_string(),
        }
    }

    /// Whether this error came from configuration (unknown selector, missing field)
    pub fn is_configuration(&self) -> bool {
        matches!(self, WorkerError::Configuration(_))
    }
}

impl From<object_store::Error> for WorkerError {
    fn from(err: object_store::Error) -> Self {
        WorkerError::upload_failed(err)
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;
