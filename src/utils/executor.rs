//! Command execution abstraction for testability
//!
//! This module provides a trait-based abstraction for command execution,
//! enabling dependency injection and mocking for tests.

use super::command::CommandInvocation;
use anyhow::Result;
use async_trait::async_trait;
use std::process::Output;

/// Abstraction for command execution, enabling mocking in tests
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command, failing on non-zero exit
    async fn run(&self, invocation: &CommandInvocation) -> Result<Output>;
}

/// Default implementation using real subprocess calls
#[derive(Debug, Clone, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for RealExecutor {
    async fn run(&self, invocation: &CommandInvocation) -> Result<Output> {
        super::command::run_command(invocation).await
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
#[allow(dead_code)]
pub mod mock {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Recorded command invocation
    #[derive(Clone, Debug)]
    pub struct CommandCall {
        pub program: String,
        pub args: Vec<String>,
        /// Overlay variables with their values exposed, for assertions
        pub env: HashMap<String, String>,
    }

    /// Response configuration for mock
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        Success { stdout: String, stderr: String },
        /// Succeed and write `contents` to the file named by the output-file flag
        WriteOutput { contents: String },
        Failure { stderr: String, exit_code: i32 },
        Timeout,
    }

    impl Default for MockResponse {
        fn default() -> Self {
            MockResponse::Success {
                stdout: String::new(),
                stderr: String::new(),
            }
        }
    }

    /// Output-file flags understood by the mock (`pg_dump`, `mysqldump`)
    const OUTPUT_FLAGS: &[&str] = &["--file=", "--result-file="];

    /// Mock executor for testing
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Recorded command invocations
        pub calls: Arc<Mutex<Vec<CommandCall>>>,
        /// Pre-configured responses: program name -> response
        responses: Arc<Mutex<HashMap<String, MockResponse>>>,
        /// Default response when no specific response is configured
        default_response: Arc<Mutex<MockResponse>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure a response for a specific program
        pub fn expect(self, program: &str, response: MockResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(program.to_string(), response);
            self
        }

        /// Set the default response for unconfigured programs
        pub fn with_default_response(self, response: MockResponse) -> Self {
            *self.default_response.lock().unwrap() = response;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<CommandCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Check if a program was called
        pub fn was_called(&self, program: &str) -> bool {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .any(|c| c.program == program)
        }

        /// Total number of calls
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn record_call(&self, invocation: &CommandInvocation) {
            let env = invocation
                .env
                .keys()
                .into_iter()
                .filter_map(|k| {
                    invocation
                        .env
                        .get(k)
                        .map(|v| (k.to_string(), v.expose_secret().to_string()))
                })
                .collect();

            self.calls.lock().unwrap().push(CommandCall {
                program: invocation.program.clone(),
                args: invocation.args.clone(),
                env,
            });
        }

        fn get_response(&self, program: &str) -> MockResponse {
            self.responses
                .lock()
                .unwrap()
                .get(program)
                .cloned()
                .unwrap_or_else(|| self.default_response.lock().unwrap().clone())
        }

        fn output_path(invocation: &CommandInvocation) -> Option<PathBuf> {
            invocation.args.iter().find_map(|arg| {
                OUTPUT_FLAGS
                    .iter()
                    .find_map(|flag| arg.strip_prefix(flag))
                    .map(PathBuf::from)
            })
        }

        fn success(stdout: String, stderr: String) -> Output {
            Output {
                status: std::process::ExitStatus::default(),
                stdout: stdout.into_bytes(),
                stderr: stderr.into_bytes(),
            }
        }
    }

    #[async_trait]
    impl CommandExecutor for MockExecutor {
        async fn run(&self, invocation: &CommandInvocation) -> Result<Output> {
            self.record_call(invocation);

            match self.get_response(&invocation.program) {
                MockResponse::Success { stdout, stderr } => Ok(Self::success(stdout, stderr)),
                MockResponse::WriteOutput { contents } => {
                    let path = Self::output_path(invocation)
                        .ok_or_else(|| anyhow::anyhow!("No output file argument"))?;
                    std::fs::write(&path, contents)?;
                    Ok(Self::success(String::new(), String::new()))
                }
                MockResponse::Failure { stderr, exit_code } => {
                    anyhow::bail!("Command failed with exit code {:?}: {}", exit_code, stderr)
                }
                MockResponse::Timeout => {
                    anyhow::bail!("Command timed out")
                }
            }
        }
    }
}
