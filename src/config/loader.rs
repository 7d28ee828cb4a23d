use super::types::*;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}")]
    ParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse worker config")]
    TomlError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing required field '{field}' in {context}")]
    MissingField { field: String, context: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Unknown target type '{0}'")]
    UnknownTargetType(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.display().to_string(),
        source,
    })
}

/// Load a job specification from a JSON object of strings
pub fn load_job_spec<P: AsRef<Path>>(path: P) -> Result<JobSpec> {
    let path = path.as_ref();
    let contents = read_file(path)?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError {
        path: path.display().to_string(),
        source,
    })
}

/// Load the ordered target list from a JSON array of string objects.
///
/// The file must exist. A dump-only run is requested with an empty array.
pub fn load_targets<P: AsRef<Path>>(path: P) -> Result<Vec<TargetSpec>> {
    let path = path.as_ref();
    let contents = read_file(path)?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError {
        path: path.display().to_string(),
        source,
    })
}

/// Load and validate worker settings from a TOML file
pub fn load_worker_config<P: AsRef<Path>>(path: P) -> Result<WorkerConfig> {
    let contents = read_file(path.as_ref())?;
    let config: WorkerConfig = toml::from_str(&contents)?;
    validate_worker_config(&config)?;
    Ok(config)
}

/// Validate worker settings
pub fn validate_worker_config(config: &WorkerConfig) -> Result<()> {
    if config.worker.upload_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "worker.upload_concurrency must be at least 1".to_string(),
        ));
    }

    if config.worker.dump_timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "worker.dump_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.logging.max_files == 0 {
        return Err(ConfigError::ValidationError(
            "logging.max_files must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Resolve the secret namespace: explicit value, then POD_NAMESPACE, then "default"
pub fn resolve_namespace(explicit: Option<&str>) -> String {
    explicit
        .filter(|ns| !ns.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var("POD_NAMESPACE").ok().filter(|ns| !ns.is_empty()))
        .unwrap_or_else(|| "default".to_string())
}
