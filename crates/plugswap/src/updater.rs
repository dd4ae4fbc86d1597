//! The plugin update pipeline
//!
//! [`Updater::run`] executes the steps strictly in order:
//!
//! 1. probe `/login` (precondition, never retried)
//! 2. list installed plugins and uninstall the target if present
//! 3. settle, then run the Jenkins CLI installer
//! 4. request `/exit`, settle, then launch `jenkins.war` detached
//! 5. poll `/login` until it answers 200 or the attempt budget runs out
//! 6. settle, then list plugins again and report a [`Verdict`]
//!
//! Any fatal error returns immediately; earlier steps are not undone.
//!
//! # Example
//!
//! ```ignore
//! let updater = Updater::connect(request, PipelineTimings::default(), TokioSleeper)?
//!     .on_event(|event| println!("{}", event.description()));
//!
//! let report = updater.run().await?;
//! println!("{}", report.verdict.description());
//! ```

use crate::clock::Sleeper;
use crate::control::ControlClient;
use crate::error::{ControlError, Result, UpdateError};
use crate::events::{SettleReason, UninstallOutcome, UpdateEvent, UpdateReport, Verdict};
use crate::installer::{self, DEFAULT_JAVA};
use crate::request::{PipelineTimings, UpdateRequest};
use plugswap_transport::{
    HttpTransport, HttpTransportConfig, ProcessInvoker, SystemProcessInvoker, Transport,
    TransportError,
};
use std::sync::Arc;
use std::time::Duration;

/// Callback receiving every pipeline event
pub type EventCallback = Arc<dyn Fn(&UpdateEvent) + Send + Sync>;

/// Runs the update pipeline against one server.
pub struct Updater<T, P, S> {
    control: ControlClient<T>,
    request: UpdateRequest,
    timings: PipelineTimings,
    processes: P,
    sleeper: S,
    java: String,
    on_event: Option<EventCallback>,
}

impl<S: Sleeper> Updater<HttpTransport, SystemProcessInvoker, S> {
    /// Updater talking to a real server and running real processes.
    ///
    /// Every HTTP request is bounded by `timings.request_timeout`. Pass
    /// [`TokioSleeper`](crate::TokioSleeper) for wall-clock waits.
    pub fn connect(
        request: UpdateRequest,
        timings: PipelineTimings,
        sleeper: S,
    ) -> std::result::Result<Self, TransportError> {
        let transport =
            HttpTransport::with_config(HttpTransportConfig::with_timeout(timings.request_timeout))?;
        Ok(Self::new(
            request,
            timings,
            transport,
            SystemProcessInvoker,
            sleeper,
        ))
    }
}

impl<T: Transport, P: ProcessInvoker, S: Sleeper> Updater<T, P, S> {
    /// Assemble an updater from its collaborators
    pub fn new(
        request: UpdateRequest,
        timings: PipelineTimings,
        transport: T,
        processes: P,
        sleeper: S,
    ) -> Self {
        Self {
            control: ControlClient::new(transport, request.clone()),
            request,
            timings,
            processes,
            sleeper,
            java: DEFAULT_JAVA.to_string(),
            on_event: None,
        }
    }

    /// Use a specific Java launcher for the installer and the server
    pub fn with_java(mut self, java: impl Into<String>) -> Self {
        self.java = java.into();
        self
    }

    /// Register a callback for pipeline events
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UpdateEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(callback));
        self
    }

    /// Run the whole pipeline.
    ///
    /// Returns a report once verification has run, whatever its verdict.
    pub async fn run(&self) -> Result<UpdateReport> {
        self.check_reachable().await?;
        self.emit(UpdateEvent::Started);

        let uninstall = self.uninstall_if_present().await?;
        self.settle(SettleReason::PostUninstall, self.timings.post_uninstall_settle)
            .await;

        let install_output = self.install().await?;

        let restart_accepted = self.request_restart().await?;
        self.settle(SettleReason::PostShutdown, self.timings.post_shutdown_settle)
            .await;

        self.launch_server()?;
        let ready_after_attempts = self.wait_until_ready().await?;
        self.settle(SettleReason::PostReady, self.timings.post_ready_settle)
            .await;

        let verdict = self.verify().await;

        Ok(UpdateReport {
            uninstall,
            install_output,
            restart_accepted,
            ready_after_attempts,
            verdict,
        })
    }

    /// Probe the login page once; anything but 200 is fatal.
    pub async fn check_reachable(&self) -> Result<()> {
        self.emit(UpdateEvent::CheckingServer {
            url: self.request.jenkins_url().to_string(),
        });

        if self.control.is_reachable().await {
            Ok(())
        } else {
            tracing::warn!(url = self.request.jenkins_url(), "Jenkins is not reachable");
            Err(UpdateError::Unreachable {
                url: self.request.jenkins_url().to_string(),
            })
        }
    }

    /// Uninstall the plugin if the plugin manager lists it.
    pub async fn uninstall_if_present(&self) -> Result<UninstallOutcome> {
        let plugin = self.request.plugin_name();
        self.emit(UpdateEvent::CheckingPlugin {
            plugin: plugin.to_string(),
        });

        let installed = self
            .control
            .is_installed(plugin)
            .await
            .map_err(UpdateError::Query)?;

        if !installed {
            tracing::info!(plugin, "plugin not installed, skipping uninstall");
            self.emit(UpdateEvent::UninstallSkipped {
                plugin: plugin.to_string(),
            });
            return Ok(UninstallOutcome::Skipped);
        }

        self.control
            .uninstall(plugin)
            .await
            .map_err(UpdateError::Uninstall)?;

        tracing::info!(plugin, "plugin uninstalled");
        self.emit(UpdateEvent::Uninstalled {
            plugin: plugin.to_string(),
        });
        Ok(UninstallOutcome::Removed)
    }

    /// Run the Jenkins CLI installer and return its output.
    pub async fn install(&self) -> Result<String> {
        self.emit(UpdateEvent::Installing {
            artifact: self.request.plugin_path().to_string(),
        });

        let command = installer::install_command(&self.java, &self.request);
        tracing::info!(
            command = %installer::redacted_display(&command, &self.request),
            "running installer"
        );

        let output = self
            .processes
            .run(&command)
            .await
            .map_err(|e| UpdateError::Install {
                reason: e.to_string(),
                output: String::new(),
            })?;

        if !output.success {
            tracing::warn!(status = %output.exit_description(), "installer failed");
            return Err(UpdateError::Install {
                reason: output.exit_description(),
                output: output.output,
            });
        }

        self.emit(UpdateEvent::InstallCompleted {
            output: output.output.clone(),
        });
        Ok(output.output)
    }

    /// Ask the server to exit.
    ///
    /// A non-200 answer is reported and tolerated; only a failure to get
    /// any answer is fatal.
    pub async fn request_restart(&self) -> Result<bool> {
        self.emit(UpdateEvent::StoppingServer);

        match self.control.request_exit().await {
            Ok(()) => {
                self.emit(UpdateEvent::ShutdownRequested);
                Ok(true)
            }
            Err(ControlError::UnexpectedStatus { status }) => {
                tracing::warn!(%status, "shutdown request rejected, continuing");
                self.emit(UpdateEvent::RestartRequestRejected { status });
                Ok(false)
            }
            Err(err) => Err(UpdateError::RestartRequest(err)),
        }
    }

    /// Launch `jenkins.war` detached; does not wait for readiness.
    pub fn launch_server(&self) -> Result<Option<u32>> {
        self.emit(UpdateEvent::StartingServer);

        let command = installer::launch_command(&self.java, &self.request);
        tracing::info!(command = %command.display(), "launching Jenkins");

        let pid = self
            .processes
            .spawn_detached(&command)
            .map_err(UpdateError::Launch)?;

        self.emit(UpdateEvent::ServerLaunched { pid });
        Ok(pid)
    }

    /// Poll the login page until it answers 200.
    ///
    /// Returns the 1-indexed attempt that succeeded.
    pub async fn wait_until_ready(&self) -> Result<u32> {
        self.emit(UpdateEvent::WaitingForServer);

        let max_attempts = self.timings.poll_attempts;
        for attempt in 1..=max_attempts {
            if self.control.is_reachable().await {
                tracing::info!(attempt, "Jenkins is back online");
                self.emit(UpdateEvent::ServerOnline { attempt });
                return Ok(attempt);
            }

            self.emit(UpdateEvent::ProbeFailed {
                attempt,
                max_attempts,
            });
            if attempt < max_attempts {
                self.sleeper.sleep(self.timings.poll_interval).await;
            }
        }

        Err(UpdateError::RestartTimeout {
            attempts: max_attempts,
        })
    }

    /// Look the plugin up again. Never fails; errors become
    /// [`Verdict::Unknown`].
    pub async fn verify(&self) -> Verdict {
        let verdict = match self.control.is_installed(self.request.plugin_name()).await {
            Ok(true) => Verdict::Installed,
            Ok(false) => Verdict::Missing,
            Err(err) => Verdict::Unknown(err.to_string()),
        };

        tracing::info!(?verdict, "verification finished");
        self.emit(UpdateEvent::Verified {
            verdict: verdict.clone(),
        });
        verdict
    }

    async fn settle(&self, reason: SettleReason, duration: Duration) {
        self.emit(UpdateEvent::Settling { reason, duration });
        self.sleeper.sleep(duration).await;
    }

    fn emit(&self, event: UpdateEvent) {
        tracing::debug!(?event, "pipeline event");
        if let Some(callback) = &self.on_event {
            callback(&event);
        }
    }
}
