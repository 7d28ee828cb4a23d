//! Dump providers - one per database engine
//!
//! A provider turns a [`JobSpec`] into exactly one [`Artifact`] on local disk.
//! Providers are looked up by the job's `provider` selector through a
//! [`ProviderRegistry`] populated at startup.

pub mod mysql;
pub mod postgres;

use crate::artifact::Artifact;
use crate::config::{job_keys, ConfigError, JobSpec};
use crate::error::{Result, WorkerError};
use crate::secrets::{fields, CredentialResolver};
use crate::utils::CommandExecutor;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use mysql::MysqlProvider;
pub use postgres::PostgresProvider;

/// Everything a provider needs besides the job itself
pub struct DumpContext {
    pub resolver: Arc<CredentialResolver>,
    /// Directory the dump file is written to
    pub work_dir: PathBuf,
    pub timeout: Option<Duration>,
}

/// Trait for database dump providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DumpProvider: Send + Sync {
    /// Produce one dump file for the job
    async fn dump(&self, job: &JobSpec, ctx: &DumpContext) -> Result<Artifact>;

    /// Engine name (for logging)
    fn engine(&self) -> &'static str;
}

/// Resolved connection descriptor
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub database: String,
    pub password: SecretString,
}

impl ConnectionParams {
    /// Validate connection fields, then resolve the password
    pub async fn resolve(job: &JobSpec, resolver: &CredentialResolver) -> Result<Self> {
        let host = job.require(job_keys::DB_HOST)?.to_string();
        let port_raw = job.require(job_keys::DB_PORT)?;
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidField {
                field: job_keys::DB_PORT.to_string(),
                reason: format!("'{}' is not a valid port: {}", port_raw, e),
            })?;
        let username = job.require(job_keys::DB_USERNAME)?.to_string();
        let database = job.require(job_keys::DB_DATABASE)?.to_string();

        let reference = job.credential()?;
        let password = resolver.resolve(&reference, fields::DB_PASSWORD).await?;
        let password = {
            use secrecy::ExposeSecret;
            SecretString::from(password.expose_secret().trim().to_string())
        };

        Ok(Self {
            host,
            port,
            username,
            database,
            password,
        })
    }
}

/// Build the artifact record for a file a dump mechanism reported as written
pub(crate) async fn finish_dump(
    path: PathBuf,
    database: &str,
    provider: &str,
    created_at: DateTime<Utc>,
) -> Result<Artifact> {
    let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
        WorkerError::dump_failed(format!(
            "{} reported success but {} is missing: {}",
            provider,
            path.display(),
            e
        ))
    })?;

    Ok(Artifact {
        path,
        database: database.to_string(),
        provider: provider.to_string(),
        created_at,
        size_bytes: metadata.len(),
    })
}

/// Selector string -> provider
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn DumpProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in engines
    pub fn with_defaults(executor: Arc<dyn CommandExecutor>) -> Self {
        let mut registry = Self::new();
        registry.register(
            postgres::PROVIDER_KEY,
            Arc::new(PostgresProvider::new(executor.clone())),
        );
        registry.register(mysql::PROVIDER_KEY, Arc::new(MysqlProvider::new(executor)));
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, provider: Arc<dyn DumpProvider>) {
        self.providers.insert(key.into(), provider);
    }

    pub fn get(&self, key: &str) -> std::result::Result<Arc<dyn DumpProvider>, ConfigError> {
        self.providers
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProvider(key.to_string()))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}
