//! Testing utilities
//!
//! In-memory doubles for the three seams of [`Updater`](crate::Updater) so
//! pipeline tests run without a Jenkins server, a JVM, or real sleeps.

use async_trait::async_trait;
use plugswap_transport::{
    HttpRequest, HttpResponse, ProcessConfig, ProcessInvoker, ProcessOutput, Transport,
    TransportError,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Transport that answers from a fixed script of responses
///
/// Every request is recorded. Once the script is exhausted, requests
/// fail with [`TransportError::Connection`].
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    /// Create a transport that replays `responses` in order
    pub fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests sent so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_http(&self, request: HttpRequest) -> plugswap_transport::Result<HttpResponse> {
        let url = request.url.clone();
        lock(&self.requests).push(request);
        lock(&self.responses)
            .pop_front()
            .ok_or_else(|| TransportError::Connection(format!("no scripted response for {url}")))
    }
}

enum RunBehavior {
    Exit(ProcessOutput),
    LaunchError(String),
}

/// Process invoker that records commands instead of running them
///
/// By default `run` reports a successful exit with empty output and
/// `spawn_detached` reports pid 4242.
#[derive(Clone)]
pub struct MockProcessInvoker {
    behavior: Arc<Mutex<RunBehavior>>,
    spawn_error: Arc<Mutex<Option<String>>>,
    runs: Arc<Mutex<Vec<ProcessConfig>>>,
    spawns: Arc<Mutex<Vec<ProcessConfig>>>,
}

impl MockProcessInvoker {
    /// Create an invoker whose processes all succeed
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(Mutex::new(RunBehavior::Exit(ProcessOutput {
                exit_code: Some(0),
                success: true,
                output: String::new(),
            }))),
            spawn_error: Arc::new(Mutex::new(None)),
            runs: Arc::new(Mutex::new(Vec::new())),
            spawns: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make `run` exit with `code` and print `output`
    pub fn exit_with(&self, code: i32, output: impl Into<String>) {
        *lock(&self.behavior) = RunBehavior::Exit(ProcessOutput {
            exit_code: Some(code),
            success: code == 0,
            output: output.into(),
        });
    }

    /// Make `run` fail as if the program could not be started
    pub fn fail_run(&self, message: impl Into<String>) {
        *lock(&self.behavior) = RunBehavior::LaunchError(message.into());
    }

    /// Make `spawn_detached` fail
    pub fn fail_spawn(&self, message: impl Into<String>) {
        *lock(&self.spawn_error) = Some(message.into());
    }

    /// Commands passed to `run`
    pub fn runs(&self) -> Vec<ProcessConfig> {
        lock(&self.runs).clone()
    }

    /// Commands passed to `spawn_detached`
    pub fn spawns(&self) -> Vec<ProcessConfig> {
        lock(&self.spawns).clone()
    }

    /// Total number of process invocations of either kind
    pub fn call_count(&self) -> usize {
        lock(&self.runs).len() + lock(&self.spawns).len()
    }
}

impl Default for MockProcessInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessInvoker for MockProcessInvoker {
    async fn run(&self, config: &ProcessConfig) -> plugswap_transport::Result<ProcessOutput> {
        lock(&self.runs).push(config.clone());
        match &*lock(&self.behavior) {
            RunBehavior::Exit(output) => Ok(output.clone()),
            RunBehavior::LaunchError(message) => Err(TransportError::Process(message.clone())),
        }
    }

    fn spawn_detached(&self, config: &ProcessConfig) -> plugswap_transport::Result<Option<u32>> {
        lock(&self.spawns).push(config.clone());
        match &*lock(&self.spawn_error) {
            Some(message) => Err(TransportError::Process(message.clone())),
            None => Ok(Some(4242)),
        }
    }
}

/// Sleeper that records requested durations and returns at once
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far, in order
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.slept).clone()
    }
}

#[async_trait]
impl crate::clock::Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.slept).push(duration);
    }
}
