use anyhow::{Context, Result};
use backup_worker::config::{self, expand_tilde, LogFormat, WorkerConfig};
use backup_worker::managers::logging::{init_logging, LoggingConfig};
use backup_worker::managers::runner::{JobRunner, RunSettings};
use backup_worker::providers::ProviderRegistry;
use backup_worker::secrets::{CredentialResolver, KubeSecretStore};
use backup_worker::targets::TargetRegistry;
use backup_worker::utils::{CommandExecutor, RealExecutor};
use backup_worker::CleanupPolicy;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "backup-worker")]
#[command(about = "Dump a database and upload the dump to storage targets", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to worker settings (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the job specification JSON
    #[arg(long)]
    job_spec: Option<PathBuf>,

    /// Path to the targets JSON
    #[arg(long)]
    targets: Option<PathBuf>,

    /// Namespace secrets are read from
    #[arg(short, long)]
    namespace: Option<String>,

    /// Directory the dump file is written to
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Keep the local dump file after uploading
    #[arg(long)]
    keep_artifact: bool,

    /// Console log level (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,

    /// Console log format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Kubeconfig used outside the cluster
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Only use in-cluster credentials for the secret store
    #[arg(long)]
    no_kubeconfig_fallback: bool,
}

impl Cli {
    /// CLI flags override file values
    fn apply(&self, config: &mut WorkerConfig) {
        if let Some(path) = &self.job_spec {
            config.worker.job_spec = path.clone();
        }
        if let Some(path) = &self.targets {
            config.worker.targets = path.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.worker.namespace = Some(namespace.clone());
        }
        if let Some(dir) = &self.work_dir {
            config.worker.work_dir = dir.clone();
        }
        if self.keep_artifact {
            config.worker.keep_artifact = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(path) = &self.kubeconfig {
            config.secrets.kubeconfig = Some(path.clone());
        }
        if self.no_kubeconfig_fallback {
            config.secrets.kubeconfig_fallback = false;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not up yet, so settings errors go straight to stderr
    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&LoggingConfig::from_settings(&settings.logging)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&settings).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Backup job failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> Result<WorkerConfig> {
    let mut settings = match &cli.config {
        Some(path) => config::load_worker_config(expand_tilde(path))
            .with_context(|| format!("Failed to load worker settings from {:?}", path))?,
        None => WorkerConfig::default(),
    };
    cli.apply(&mut settings);
    config::validate_worker_config(&settings)?;
    Ok(settings)
}

/// One run. `Ok(false)` means the dump succeeded but a target failed.
async fn run(settings: &WorkerConfig) -> Result<bool> {
    let job = config::load_job_spec(expand_tilde(&settings.worker.job_spec))?;
    let targets = config::load_targets(expand_tilde(&settings.worker.targets))?;

    let store = Arc::new(KubeSecretStore::from_settings(&settings.secrets));
    let resolver = Arc::new(CredentialResolver::new(
        store,
        config::resolve_namespace(settings.worker.namespace.as_deref()),
    ));
    info!("Reading secrets from namespace '{}'", resolver.namespace());
    let executor: Arc<dyn CommandExecutor> = Arc::new(RealExecutor::new());

    let run_settings = RunSettings {
        work_dir: expand_tilde(&settings.worker.work_dir),
        cleanup: if settings.worker.keep_artifact {
            CleanupPolicy::Keep
        } else {
            CleanupPolicy::Remove
        },
        upload_concurrency: settings.worker.upload_concurrency,
        dump_timeout: settings.worker.dump_timeout_secs.map(Duration::from_secs),
    };

    let mut runner = JobRunner::new(
        ProviderRegistry::with_defaults(executor),
        TargetRegistry::with_defaults(),
        resolver,
        run_settings,
    );

    let report = runner.run(&job, &targets).await?;

    if report.succeeded() {
        info!("Backup of {} finished", report.artifact.database);
    } else {
        error!(
            "Backup of {} finished with {} failed target(s)",
            report.artifact.database,
            report.failures().count()
        );
    }

    Ok(report.succeeded())
}
