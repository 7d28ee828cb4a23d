//! Test context and harness
//!
//! Provides a unified context for setting up and tearing down test environments.

use crate::fixtures::TEST_NAMESPACE;
use anyhow::Result;
use backup_worker::artifact::CleanupPolicy;
use backup_worker::config::{JobSpec, TargetSpec};
use backup_worker::managers::runner::{JobRunner, RunSettings};
use backup_worker::providers::ProviderRegistry;
use backup_worker::secrets::{CredentialResolver, SecretStore};
use backup_worker::targets::TargetRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test context that manages test resources and provides common utilities
pub struct TestContext {
    /// Temporary directory for test files
    temp_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with a temporary directory
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Get the temporary directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory dumps are written to
    pub fn work_dir(&self) -> PathBuf {
        self.temp_dir.path().join("work")
    }

    /// Create a subdirectory in the temp dir
    pub fn create_subdir(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create subdirectory");
        path
    }

    /// Create a file in the temp dir
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Write a job spec as JSON
    pub fn write_job_spec(&self, job: &JobSpec) -> PathBuf {
        let json = serde_json::to_string_pretty(job).expect("Failed to serialize job spec");
        self.create_file("jobSpec.json", &json)
    }

    /// Write a target list as JSON
    pub fn write_targets(&self, targets: &[TargetSpec]) -> PathBuf {
        let json = serde_json::to_string_pretty(targets).expect("Failed to serialize targets");
        self.create_file("targets.json", &json)
    }

    /// Worker settings file pointing at this context's spec files
    pub fn write_worker_config(&self) -> PathBuf {
        let toml = crate::fixtures::worker_config_toml()
            .replace("{job_spec}", &self.temp_dir().join("jobSpec.json").display().to_string())
            .replace("{targets}", &self.temp_dir().join("targets.json").display().to_string())
            .replace("{work_dir}", &self.work_dir().display().to_string());
        self.create_file("worker.toml", &toml)
    }

    /// Runner writing into this context's work dir
    pub fn runner(
        &self,
        providers: ProviderRegistry,
        targets: TargetRegistry,
        store: Arc<dyn SecretStore>,
        cleanup: CleanupPolicy,
    ) -> JobRunner {
        let resolver = Arc::new(CredentialResolver::new(store, TEST_NAMESPACE));
        JobRunner::new(
            providers,
            targets,
            resolver,
            RunSettings {
                work_dir: self.work_dir(),
                cleanup,
                upload_concurrency: 2,
                dump_timeout: None,
            },
        )
    }

    /// Check if a file exists in the temp directory
    pub fn file_exists(&self, name: &str) -> bool {
        self.temp_dir.path().join(name).exists()
    }

    /// Read a file from the temp directory
    pub fn read_file(&self, name: &str) -> Result<String> {
        let path = self.temp_dir.path().join(name);
        Ok(std::fs::read_to_string(path)?)
    }

    /// Files currently in the work dir
    pub fn work_dir_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.work_dir())
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension trait for assertion helpers
pub trait ResultAssertions<T> {
    /// Assert that the result is Ok and return the value
    fn assert_ok(self) -> T;

    /// Assert that the result is Err
    fn assert_err(self);

    /// Assert that the result is Err and the error message contains the given string
    fn assert_err_contains(self, needle: &str);
}

impl<T: std::fmt::Debug, E: std::fmt::Display> ResultAssertions<T> for std::result::Result<T, E> {
    fn assert_ok(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {}", e),
        }
    }

    fn assert_err(self) {
        if let Ok(v) = self {
            panic!("Expected Err, got Ok: {:?}", v);
        }
    }

    fn assert_err_contains(self, needle: &str) {
        match self {
            Ok(v) => panic!("Expected Err containing '{}', got Ok: {:?}", needle, v),
            Err(e) => {
                let err_msg = e.to_string();
                assert!(
                    err_msg.contains(needle),
                    "Error '{}' does not contain '{}'",
                    err_msg,
                    needle
                );
            }
        }
    }
}

/// Extension trait for Option assertions
pub trait OptionAssertions<T> {
    /// Assert that the option is Some and return the value
    fn assert_some(self) -> T;

    /// Assert that the option is None
    fn assert_none(self);
}

impl<T: std::fmt::Debug> OptionAssertions<T> for Option<T> {
    fn assert_some(self) -> T {
        match self {
            Some(v) => v,
            None => panic!("Expected Some, got None"),
        }
    }

    fn assert_none(self) {
        if let Some(v) = self {
            panic!("Expected None, got Some: {:?}", v);
        }
    }
}
