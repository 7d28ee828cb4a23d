//! Fluent builders for job and target specs
//!
//! Start from a preset, override fields, then `build()`.

use backup_worker::config::{job_keys, target_keys, JobSpec, TargetSpec};
use std::collections::HashMap;
use std::path::Path;

/// Builder for [`JobSpec`]
#[derive(Debug, Clone, Default)]
pub struct JobSpecBuilder {
    fields: HashMap<String, String>,
}

impl JobSpecBuilder {
    /// Empty job spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Postgres job with an inline password
    pub fn postgres() -> Self {
        Self::new()
            .provider("postgres.pg_dump")
            .host("localhost")
            .port(5432)
            .username("postgres")
            .database("testdb")
            .password("testpass")
    }

    /// MySQL job with an inline password
    pub fn mysql() -> Self {
        Self::new()
            .provider("mysql.mysqldump")
            .host("localhost")
            .port(3306)
            .username("root")
            .database("testdb")
            .password("testpass")
    }

    pub fn provider(self, provider: &str) -> Self {
        self.field(job_keys::PROVIDER, provider)
    }

    pub fn host(self, host: &str) -> Self {
        self.field(job_keys::DB_HOST, host)
    }

    pub fn port(self, port: u16) -> Self {
        self.field(job_keys::DB_PORT, &port.to_string())
    }

    pub fn username(self, username: &str) -> Self {
        self.field(job_keys::DB_USERNAME, username)
    }

    pub fn database(self, database: &str) -> Self {
        self.field(job_keys::DB_DATABASE, database)
    }

    pub fn password(self, password: &str) -> Self {
        self.field(job_keys::DB_PASSWORD, password)
    }

    pub fn password_secret(self, name: &str) -> Self {
        self.field(job_keys::PASSWORD_SECRET_NAME, name)
    }

    /// Set an arbitrary field
    pub fn field(mut self, key: &str, value: &str) -> Self {
        self.fields.insert(key.to_string(), value.to_string());
        self
    }

    /// Drop a field set by a preset
    pub fn without(mut self, key: &str) -> Self {
        self.fields.remove(key);
        self
    }

    pub fn build(self) -> JobSpec {
        JobSpec::new(self.fields)
    }
}

/// Builder for [`TargetSpec`]
#[derive(Debug, Clone, Default)]
pub struct TargetSpecBuilder {
    fields: HashMap<String, String>,
}

impl TargetSpecBuilder {
    /// Target of an arbitrary type
    pub fn of_type(target_type: &str) -> Self {
        Self::default().field(target_keys::TYPE, target_type)
    }

    /// Local directory target
    pub fn local(directory: impl AsRef<Path>) -> Self {
        Self::of_type("local").field(
            target_keys::DIRECTORY,
            &directory.as_ref().display().to_string(),
        )
    }

    pub fn s3(bucket: &str, secret_name: &str) -> Self {
        Self::of_type("s3")
            .bucket(bucket)
            .field(target_keys::SECRET_NAME, secret_name)
    }

    pub fn gcs(bucket: &str, secret_name: &str) -> Self {
        Self::of_type("gcs")
            .bucket(bucket)
            .field(target_keys::SECRET_NAME, secret_name)
    }

    pub fn bucket(self, bucket: &str) -> Self {
        self.field(target_keys::BUCKET_NAME, bucket)
    }

    pub fn prefix(self, prefix: &str) -> Self {
        self.field(target_keys::BUCKET_KEY, prefix)
    }

    pub fn field(mut self, key: &str, value: &str) -> Self {
        self.fields.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> TargetSpec {
        TargetSpec::new(self.fields)
    }
}
