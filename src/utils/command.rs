//! Utilities for running commands with proper error handling and timeouts

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::process::{Output, Stdio};
use std::time::Duration;
use tracing::{debug, error};

/// Environment variables applied to a single child process only.
///
/// Values are secret; `Debug` lists variable names only.
#[derive(Default)]
pub struct EnvOverlay {
    vars: Vec<(String, SecretString)>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: SecretString) -> Self {
        self.vars.push((key.into(), value));
        self
    }

    pub fn keys(&self) -> Vec<&str> {
        self.vars.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&SecretString> {
        self.vars.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn apply(&self, cmd: &mut tokio::process::Command) {
        for (key, value) in &self.vars {
            cmd.env(key, value.expose_secret());
        }
    }
}

impl fmt::Debug for EnvOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvOverlay").field("keys", &self.keys()).finish()
    }
}

/// A fully described subprocess invocation
#[derive(Debug)]
pub struct CommandInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: EnvOverlay,
    pub timeout: Option<Duration>,
}

impl CommandInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: EnvOverlay::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Run a command, failing on non-zero exit status
pub async fn run_command(invocation: &CommandInvocation) -> Result<Output> {
    let program = which::which(&invocation.program).with_context(|| {
        format!(
            "{} executable not found in PATH. Please ensure the database client tools are installed.",
            invocation.program
        )
    })?;

    let mut cmd = tokio::process::Command::new(&program);
    cmd.args(&invocation.args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);
    invocation.env.apply(&mut cmd);

    debug!(
        "Running command: {} {} (env overlay: {:?})",
        invocation.program,
        invocation.args.join(" "),
        invocation.env.keys()
    );

    let output = match invocation.timeout {
        Some(timeout_duration) => tokio::time::timeout(timeout_duration, cmd.output())
            .await
            .map_err(|_| anyhow::anyhow!("Command timed out after {:?}", timeout_duration))?
            .with_context(|| format!("Failed to execute {}", invocation.program))?,
        None => cmd
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", invocation.program))?,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("Command failed: {} {}", invocation.program, invocation.args.join(" "));
        error!("Stderr: {}", stderr.trim());
        anyhow::bail!(
            "Command failed with exit code {:?}: {}",
            output.status.code(),
            stderr.trim()
        );
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        debug!("Command stderr: {}", stderr.trim());
    }

    Ok(output)
}
