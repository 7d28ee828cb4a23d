//! MySQL / MariaDB dumps via `mysqldump`

use super::{finish_dump, ConnectionParams, DumpContext, DumpProvider};
use crate::artifact::{artifact_file_name, Artifact};
use crate::config::JobSpec;
use crate::error::{Result, WorkerError};
use crate::utils::{CommandExecutor, CommandInvocation, EnvOverlay};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub const PROVIDER_KEY: &str = "mysql.mysqldump";

pub struct MysqlProvider {
    executor: Arc<dyn CommandExecutor>,
}

impl MysqlProvider {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl DumpProvider for MysqlProvider {
    async fn dump(&self, job: &JobSpec, ctx: &DumpContext) -> Result<Artifact> {
        let params = ConnectionParams::resolve(job, &ctx.resolver).await?;

        let created_at = Utc::now();
        let path = ctx
            .work_dir
            .join(artifact_file_name(&params.database, created_at));

        info!(
            "Dumping MySQL database '{}' from {}:{} to {:?}",
            params.database, params.host, params.port, path
        );

        let invocation = CommandInvocation::new("mysqldump")
            .arg(format!("--host={}", params.host))
            .arg(format!("--port={}", params.port))
            .arg(format!("--user={}", params.username))
            .arg("--protocol=TCP")
            .arg("--single-transaction")
            .arg("--routines")
            .arg("--triggers")
            .arg(format!("--result-file={}", path.display()))
            .arg(&params.database)
            .env(EnvOverlay::new().with("MYSQL_PWD", params.password))
            .timeout(ctx.timeout);

        self.executor.run(&invocation).await.map_err(|e| {
            WorkerError::dump_failed(format!("mysqldump of '{}': {:#}", params.database, e))
        })?;

        let artifact = finish_dump(path, &params.database, PROVIDER_KEY, created_at).await?;
        info!("File is saved to {:?} ({} bytes)", artifact.path, artifact.size_bytes);
        Ok(artifact)
    }

    fn engine(&self) -> &'static str {
        "mysql"
    }
}
