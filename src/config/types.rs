use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::loader::{ConfigError, Result};
use crate::secrets::CredentialReference;

/// Job specification keys
pub mod job_keys {
    pub const PROVIDER: &str = "provider";
    pub const DB_HOST: &str = "dbHost";
    pub const DB_PORT: &str = "dbPort";
    pub const DB_USERNAME: &str = "dbUsername";
    pub const DB_DATABASE: &str = "dbDatabase";
    pub const DB_PASSWORD: &str = "dbPassword";
    pub const PASSWORD_SECRET_NAME: &str = "passwordSecretName";
}

/// Target specification keys
pub mod target_keys {
    pub const TYPE: &str = "type";
    pub const SECRET_NAME: &str = "secretName";
    pub const BUCKET_NAME: &str = "bucketName";
    pub const BUCKET_KEY: &str = "bucketKey";
    pub const AWS_REGION: &str = "awsRegion";
    pub const ENDPOINT: &str = "endpoint";
    pub const DIRECTORY: &str = "directory";
}

/// One dump request: a flat string mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct JobSpec {
    fields: HashMap<String, String>,
}

impl JobSpec {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    /// Get a field, treating empty values as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Get a required field
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| ConfigError::MissingField {
            field: key.to_string(),
            context: "job spec".to_string(),
        })
    }

    /// Engine selector
    pub fn provider(&self) -> Result<&str> {
        self.require(job_keys::PROVIDER)
    }

    /// Database credential reference.
    ///
    /// `passwordSecretName` wins over `dbPassword` when both are present.
    pub fn credential(&self) -> Result<CredentialReference> {
        if let Some(name) = self.get(job_keys::PASSWORD_SECRET_NAME) {
            if self.fields.contains_key(job_keys::DB_PASSWORD) {
                tracing::warn!(
                    "Both {} and {} are set; using the secret reference",
                    job_keys::PASSWORD_SECRET_NAME,
                    job_keys::DB_PASSWORD
                );
            }
            return Ok(CredentialReference::External(name.to_string()));
        }

        match self.fields.get(job_keys::DB_PASSWORD) {
            Some(password) => Ok(CredentialReference::inline(password.clone())),
            None => Err(ConfigError::MissingField {
                field: format!(
                    "{} or {}",
                    job_keys::DB_PASSWORD,
                    job_keys::PASSWORD_SECRET_NAME
                ),
                context: "job spec".to_string(),
            }),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for JobSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One upload destination: a flat string mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TargetSpec {
    fields: HashMap<String, String>,
}

impl TargetSpec {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    /// Get a field, treating empty values as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| ConfigError::MissingField {
            field: key.to_string(),
            context: format!("target '{}'", self.target_type().unwrap_or("?")),
        })
    }

    /// Backend selector
    pub fn target_type(&self) -> Result<&str> {
        self.get(target_keys::TYPE).ok_or_else(|| ConfigError::MissingField {
            field: target_keys::TYPE.to_string(),
            context: "target spec".to_string(),
        })
    }

    /// Backend credential reference (always external for targets)
    pub fn credential(&self) -> Result<CredentialReference> {
        self.require(target_keys::SECRET_NAME)
            .map(|name| CredentialReference::External(name.to_string()))
    }

    /// Optional object key prefix
    pub fn key_prefix(&self) -> &str {
        self.get(target_keys::BUCKET_KEY).unwrap_or("")
    }

    /// Short label for logging
    pub fn label(&self) -> String {
        let kind = self.target_type().unwrap_or("?");
        match self
            .get(target_keys::BUCKET_NAME)
            .or_else(|| self.get(target_keys::DIRECTORY))
        {
            Some(dest) => format!("{}:{}", kind, dest),
            None => kind.to_string(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TargetSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Worker settings file (all sections optional)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkerConfig {
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub secrets: SecretsSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerSettings {
    /// Path to the job specification JSON
    #[serde(default = "default_job_spec")]
    pub job_spec: PathBuf,

    /// Path to the targets JSON
    #[serde(default = "default_targets")]
    pub targets: PathBuf,

    /// Directory dump files are written to
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Secret namespace (falls back to POD_NAMESPACE)
    #[serde(default)]
    pub namespace: Option<String>,

    /// Keep the local dump file after uploading
    #[serde(default)]
    pub keep_artifact: bool,

    /// Maximum uploads in flight
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    /// Dump subprocess timeout (none by default)
    #[serde(default)]
    pub dump_timeout_secs: Option<u64>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            job_spec: default_job_spec(),
            targets: default_targets(),
            work_dir: default_work_dir(),
            namespace: None,
            keep_artifact: false,
            upload_concurrency: default_upload_concurrency(),
            dump_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rolling log files (console only when unset)
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_log_max_files")]
    pub max_files: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            directory: None,
            max_files: default_log_max_files(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecretsSettings {
    /// Kubeconfig used when in-cluster credentials are unavailable
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// Whether to try the kubeconfig at all
    #[serde(default = "default_kubeconfig_fallback")]
    pub kubeconfig_fallback: bool,
}

impl Default for SecretsSettings {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            kubeconfig_fallback: default_kubeconfig_fallback(),
        }
    }
}

// Default value functions

fn default_job_spec() -> PathBuf { PathBuf::from("/config/jobSpec.json") }
fn default_targets() -> PathBuf { PathBuf::from("/config/targets.json") }
fn default_work_dir() -> PathBuf { PathBuf::from(".") }
fn default_upload_concurrency() -> usize { 4 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 10 }
fn default_kubeconfig_fallback() -> bool { true }
