//! Job runner - orchestrates one dump and its fan-out to targets

use crate::artifact::{Artifact, ArtifactGuard, CleanupPolicy};
use crate::config::{job_keys, JobSpec, TargetSpec};
use crate::error::{Result, WorkerError};
use crate::providers::{DumpContext, ProviderRegistry};
use crate::secrets::CredentialResolver;
use crate::targets::{ObjectLocation, TargetRegistry};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Dumping,
    Uploading,
    Done,
    Failed,
}

/// Knobs for a run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub work_dir: PathBuf,
    pub cleanup: CleanupPolicy,
    pub upload_concurrency: usize,
    pub dump_timeout: Option<Duration>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            cleanup: CleanupPolicy::Remove,
            upload_concurrency: 4,
            dump_timeout: None,
        }
    }
}

/// Result of one target upload
#[derive(Debug)]
pub struct TargetOutcome {
    /// Position in the target list
    pub index: usize,
    pub label: String,
    pub result: Result<ObjectLocation>,
}

impl TargetOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a completed dump phase produced
#[derive(Debug)]
pub struct RunReport {
    pub artifact: Artifact,
    /// One outcome per target, in target order
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    /// A run succeeds only if every target succeeded
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(TargetOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

pub struct JobRunner {
    providers: ProviderRegistry,
    targets: TargetRegistry,
    resolver: Arc<CredentialResolver>,
    settings: RunSettings,
    state: RunState,
}

impl JobRunner {
    pub fn new(
        providers: ProviderRegistry,
        targets: TargetRegistry,
        resolver: Arc<CredentialResolver>,
        settings: RunSettings,
    ) -> Self {
        Self {
            providers,
            targets,
            resolver,
            settings,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Reported once by the caller
    fn fail(&mut self, err: WorkerError) -> WorkerError {
        self.transition(RunState::Failed);
        err
    }

    /// Run the job: one dump, then every target.
    ///
    /// Errors are returned only for the dump phase. Upload failures are
    /// collected in the report and never stop the remaining targets.
    pub async fn run(&mut self, job: &JobSpec, targets: &[TargetSpec]) -> Result<RunReport> {
        let provider = match job.provider().and_then(|key| self.providers.get(key)) {
            Ok(provider) => provider,
            Err(e) => return Err(self.fail(e.into())),
        };

        info!(
            "Starting backup job: provider={}, database={}, targets={}",
            job.get(job_keys::PROVIDER).unwrap_or_default(),
            job.get(job_keys::DB_DATABASE).unwrap_or_default(),
            targets.len()
        );
        let start_time = Instant::now();
        self.transition(RunState::Dumping);

        if let Err(e) = tokio::fs::create_dir_all(&self.settings.work_dir).await {
            let err = WorkerError::dump_failed(format!(
                "failed to create work directory {}: {}",
                self.settings.work_dir.display(),
                e
            ));
            return Err(self.fail(err));
        }

        let ctx = DumpContext {
            resolver: self.resolver.clone(),
            work_dir: self.settings.work_dir.clone(),
            timeout: self.settings.dump_timeout,
        };

        let artifact = match provider.dump(job, &ctx).await {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.fail(e)),
        };
        info!(
            "{} dump finished in {:.2}s: {:?}",
            provider.engine(),
            start_time.elapsed().as_secs_f64(),
            artifact.path
        );

        let mut guard = ArtifactGuard::new(&artifact.path, self.settings.cleanup);
        if targets.is_empty() {
            info!("No targets configured, keeping artifact");
            guard.keep();
        }

        self.transition(RunState::Uploading);
        let outcomes = self.upload_all(&artifact, targets).await;
        drop(guard);

        self.transition(RunState::Done);

        let report = RunReport { artifact, outcomes };
        let failed = report.failures().count();
        info!(
            "Backup job completed in {:.2}s: {} target(s) succeeded, {} failed",
            start_time.elapsed().as_secs_f64(),
            report.outcomes.len() - failed,
            failed
        );
        Ok(report)
    }

    async fn upload_all(&self, artifact: &Artifact, targets: &[TargetSpec]) -> Vec<TargetOutcome> {
        stream::iter(targets.iter().enumerate())
            .map(|(index, spec)| self.upload_one(index, spec, artifact))
            .buffered(self.settings.upload_concurrency.max(1))
            .collect()
            .await
    }

    async fn upload_one(&self, index: usize, spec: &TargetSpec, artifact: &Artifact) -> TargetOutcome {
        let label = spec.label();
        info!("Uploading to target #{} ({})", index + 1, label);

        let result = self.dispatch(spec, artifact).await;
        match &result {
            Ok(location) => info!("Target #{} ({}) stored {}", index + 1, label, location),
            Err(e) => error!("Target #{} ({}) failed: {}", index + 1, label, e),
        }

        TargetOutcome {
            index,
            label,
            result,
        }
    }

    async fn dispatch(&self, spec: &TargetSpec, artifact: &Artifact) -> Result<ObjectLocation> {
        let target = self.targets.get(spec.target_type()?)?;
        target.upload(spec, artifact, &self.resolver).await
    }
}
