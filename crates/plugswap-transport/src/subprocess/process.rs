//! Process management for external tools

use crate::error::{Result, TransportError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;

#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Configuration for spawning a process
///
/// Arguments are passed to the program as a discrete vector; no shell is
/// involved, so separators inside an argument are never interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Program to execute (looked up on `PATH` if not absolute)
    pub program: String,

    /// Arguments to pass to the program
    pub args: Vec<String>,

    /// Extra environment variables, added to the inherited environment
    pub env: HashMap<String, String>,
}

impl ProcessConfig {
    /// Create a new process configuration
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// The full command line, for logs and error messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Result of a process that ran to completion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub exit_code: Option<i32>,

    /// Whether the process exited with status zero
    pub success: bool,

    /// Captured stdout followed by captured stderr
    pub output: String,
}

impl ProcessOutput {
    /// Describe how the process exited, e.g. `exit status: 1`
    pub fn exit_description(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status: {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Capability to launch external processes
#[async_trait]
pub trait ProcessInvoker: Send + Sync {
    /// Run the process to completion and capture its combined output
    ///
    /// A non-zero exit is reported through [`ProcessOutput::success`], not as
    /// an error; errors mean the process could not be launched or awaited.
    async fn run(&self, config: &ProcessConfig) -> Result<ProcessOutput>;

    /// Launch the process detached and return immediately
    ///
    /// Returns the process id when the platform reports one.
    fn spawn_detached(&self, config: &ProcessConfig) -> Result<Option<u32>>;
}

/// [`ProcessInvoker`] backed by `tokio::process`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProcessInvoker;

#[async_trait]
impl ProcessInvoker for SystemProcessInvoker {
    async fn run(&self, config: &ProcessConfig) -> Result<ProcessOutput> {
        tracing::debug!(command = %config.display(), "running process");

        let mut cmd = config.command();
        cmd.stdin(Stdio::null());

        let output = cmd.output().await.map_err(|e| {
            TransportError::Process(format!("Failed to run {}: {}", config.program, e))
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            output: combined,
        })
    }

    fn spawn_detached(&self, config: &ProcessConfig) -> Result<Option<u32>> {
        tracing::debug!(command = %config.display(), "spawning detached process");

        let mut cmd = config.command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        // Own process group so terminal signals sent to us do not reach it.
        #[cfg(unix)]
        cmd.process_group(0);

        #[cfg(windows)]
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);

        let child = cmd.spawn().map_err(|e| {
            TransportError::Process(format!("Failed to spawn {}: {}", config.program, e))
        })?;

        // Dropping the handle leaves the child running.
        Ok(child.id())
    }
}
