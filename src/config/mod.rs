//! Configuration module for backup-worker
//!
//! Three inputs are loaded here:
//! 1. The job specification (JSON object of strings)
//! 2. The ordered target list (JSON array of string objects)
//! 3. Optional worker settings (TOML)
//!
//! ## Example Usage
//!
//! ```no_run
//! use backup_worker::config;
//!
//! let job = config::load_job_spec("/config/jobSpec.json")?;
//! let targets = config::load_targets("/config/targets.json")?;
//!
//! println!("Provider: {}, targets: {}", job.provider()?, targets.len());
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{
    load_job_spec, load_targets, load_worker_config, resolve_namespace, validate_worker_config,
    ConfigError, Result,
};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
