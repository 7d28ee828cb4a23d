//! PostgreSQL dumps via `pg_dump`

use super::{finish_dump, ConnectionParams, DumpContext, DumpProvider};
use crate::artifact::{artifact_file_name, Artifact};
use crate::config::JobSpec;
use crate::error::{Result, WorkerError};
use crate::utils::{CommandExecutor, CommandInvocation, EnvOverlay};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub const PROVIDER_KEY: &str = "postgres.pg_dump";

pub struct PostgresProvider {
    executor: Arc<dyn CommandExecutor>,
}

impl PostgresProvider {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl DumpProvider for PostgresProvider {
    async fn dump(&self, job: &JobSpec, ctx: &DumpContext) -> Result<Artifact> {
        let params = ConnectionParams::resolve(job, &ctx.resolver).await?;

        let created_at = Utc::now();
        let path = ctx
            .work_dir
            .join(artifact_file_name(&params.database, created_at));

        info!(
            "Dumping PostgreSQL database '{}' from {}:{} to {:?}",
            params.database, params.host, params.port, path
        );

        // Password goes to the child only, never into argv or our own env
        let invocation = CommandInvocation::new("pg_dump")
            .arg("--format=plain")
            .arg(format!("--file={}", path.display()))
            .arg(format!("--host={}", params.host))
            .arg(format!("--port={}", params.port))
            .arg(format!("--username={}", params.username))
            .arg("--no-password")
            .arg(format!("--dbname={}", params.database))
            .env(EnvOverlay::new().with("PGPASSWORD", params.password))
            .timeout(ctx.timeout);

        self.executor
            .run(&invocation)
            .await
            .map_err(|e| WorkerError::dump_failed(format!("pg_dump of '{}': {:#}", params.database, e)))?;

        let artifact = finish_dump(path, &params.database, PROVIDER_KEY, created_at).await?;
        info!(
            "Database dump created successfully: {:?} ({} bytes)",
            artifact.path, artifact.size_bytes
        );
        Ok(artifact)
    }

    fn engine(&self) -> &'static str {
        "postgres"
    }
}
