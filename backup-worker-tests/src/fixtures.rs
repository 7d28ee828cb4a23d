//! Test fixtures and sample data

use backup_worker::artifact::Artifact;
use backup_worker::secrets::mock::MockSecretStore;
use chrono::{TimeZone, Utc};
use std::path::Path;

pub const TEST_NAMESPACE: &str = "backups";

/// A small plain-SQL dump
pub fn sample_dump() -> &'static str {
    "--\n-- PostgreSQL database dump\n--\n\nCREATE TABLE orders (id integer);\nINSERT INTO orders VALUES (1);\n"
}

/// Write a sample dump into `dir` and describe it as an artifact
pub fn sample_artifact(dir: &Path, database: &str) -> Artifact {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    let path = dir.join(format!("{}_20240309140507.sql", database));
    std::fs::write(&path, sample_dump()).expect("Failed to write sample dump");
    Artifact {
        path,
        database: database.to_string(),
        provider: "postgres.pg_dump".to_string(),
        created_at,
        size_bytes: sample_dump().len() as u64,
    }
}

/// Secret store holding a database password under `dbPassword`
pub fn store_with_db_password(name: &str, password: &str) -> MockSecretStore {
    MockSecretStore::new().with_secret(TEST_NAMESPACE, name, &[("dbPassword", password)])
}

/// Secret store holding S3 credentials
pub fn store_with_s3_credentials(name: &str) -> MockSecretStore {
    MockSecretStore::new().with_secret(
        TEST_NAMESPACE,
        name,
        &[("accessKey", "AKIAEXAMPLE"), ("secretKey", "wJalrXUtnFEMI")],
    )
}

/// Worker settings TOML template
///
/// Placeholders: `{job_spec}`, `{targets}`, `{work_dir}`
pub fn worker_config_toml() -> &'static str {
    r#"
[worker]
job_spec = "{job_spec}"
targets = "{targets}"
work_dir = "{work_dir}"
namespace = "backups"
upload_concurrency = 2

[logging]
level = "debug"
format = "json"

[secrets]
kubeconfig_fallback = false
"#
}
