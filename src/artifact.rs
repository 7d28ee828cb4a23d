//! Dump artifacts and their local lifetime

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// The single file produced by one dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub database: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

impl Artifact {
    /// Base file name of the artifact
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// File name for a dump of `database` taken at `timestamp`.
///
/// Granularity is one second: two dumps of the same database within the
/// same second get the same name. Path separators in the database name
/// become `_` so the file always lands directly in the work directory.
pub fn artifact_file_name(database: &str, timestamp: DateTime<Utc>) -> String {
    let database = database.replace(['/', '\\'], "_");
    format!("{}_{}.sql", database, timestamp.format("%Y%m%d%H%M%S"))
}

/// What happens to the local artifact once the run is over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPolicy {
    Remove,
    Keep,
}

/// Removes the artifact file when dropped, unless the policy keeps it
pub struct ArtifactGuard {
    path: PathBuf,
    policy: CleanupPolicy,
}

impl ArtifactGuard {
    pub fn new(path: impl Into<PathBuf>, policy: CleanupPolicy) -> Self {
        Self {
            path: path.into(),
            policy,
        }
    }

    /// Keep the file regardless of the original policy
    pub fn keep(&mut self) {
        self.policy = CleanupPolicy::Keep;
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        match self.policy {
            CleanupPolicy::Keep => info!("Keeping local artifact {:?}", self.path),
            CleanupPolicy::Remove => match std::fs::remove_file(&self.path) {
                Ok(()) => debug!("Removed local artifact {:?}", self.path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove local artifact {:?}: {}", self.path, e),
            },
        }
    }
}
