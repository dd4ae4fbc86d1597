//! Pipeline events and the final report
//!
//! Every step of the pipeline emits an [`UpdateEvent`]. The binary prints
//! one status line per event; tests use them to check step order.

use std::time::Duration;

/// Why the pipeline is pausing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleReason {
    /// After uninstall, before the installer runs
    PostUninstall,
    /// After the shutdown request, before the server is launched
    PostShutdown,
    /// After the server is reachable, before verification
    PostReady,
}

/// Something that happened during an update run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    /// About to probe the login page
    CheckingServer {
        /// Server base URL
        url: String,
    },

    /// The server is reachable and the pipeline has begun
    Started,

    /// Looking the plugin up in the installed plugin list
    CheckingPlugin {
        /// Plugin short name
        plugin: String,
    },

    /// The plugin was not installed, nothing to uninstall
    UninstallSkipped {
        /// Plugin short name
        plugin: String,
    },

    /// The uninstall request was accepted
    Uninstalled {
        /// Plugin short name
        plugin: String,
    },

    /// Pausing for a fixed delay
    Settling {
        /// Which wait this is
        reason: SettleReason,
        /// How long
        duration: Duration,
    },

    /// Running the installer
    Installing {
        /// Plugin artifact path
        artifact: String,
    },

    /// The installer exited successfully
    InstallCompleted {
        /// Captured installer output
        output: String,
    },

    /// Sending the shutdown request
    StoppingServer,

    /// The shutdown request was accepted
    ShutdownRequested,

    /// The shutdown request was answered with a non-200 status
    RestartRequestRejected {
        /// Status line text
        status: String,
    },

    /// Launching the server process
    StartingServer,

    /// The server process was spawned
    ServerLaunched {
        /// Process id, if known
        pid: Option<u32>,
    },

    /// Starting to poll the login page
    WaitingForServer,

    /// A readiness probe did not answer 200
    ProbeFailed {
        /// 1-indexed attempt number
        attempt: u32,
        /// Attempt budget
        max_attempts: u32,
    },

    /// A readiness probe answered 200
    ServerOnline {
        /// 1-indexed attempt number
        attempt: u32,
    },

    /// Outcome of the final plugin lookup
    Verified {
        /// The verdict
        verdict: Verdict,
    },
}

impl UpdateEvent {
    /// Get a human-readable description of this event
    pub fn description(&self) -> String {
        match self {
            UpdateEvent::CheckingServer { url } => format!("Checking Jenkins at {url}..."),
            UpdateEvent::Started => "Starting Jenkins plugin update process...".to_string(),
            UpdateEvent::CheckingPlugin { plugin } => {
                format!("Checking if plugin {plugin} exists...")
            }
            UpdateEvent::UninstallSkipped { .. } => {
                "Plugin is not installed, skipping uninstallation.".to_string()
            }
            UpdateEvent::Uninstalled { .. } => "Plugin uninstalled successfully!".to_string(),
            UpdateEvent::Settling { reason, duration } => {
                let what = match reason {
                    SettleReason::PostUninstall => "for uninstall to settle",
                    SettleReason::PostShutdown => "for Jenkins to shut down",
                    SettleReason::PostReady => "for plugins to load",
                };
                format!("Waiting {}s {what}...", duration.as_secs())
            }
            UpdateEvent::Installing { artifact } => format!("Uploading new plugin {artifact}..."),
            UpdateEvent::InstallCompleted { output } => {
                let output = output.trim_end();
                if output.is_empty() {
                    "Plugin installed successfully!".to_string()
                } else {
                    format!("{output}\nPlugin installed successfully!")
                }
            }
            UpdateEvent::StoppingServer => "Stopping Jenkins...".to_string(),
            UpdateEvent::ShutdownRequested => "Jenkins is shutting down...".to_string(),
            UpdateEvent::RestartRequestRejected { status } => {
                format!("Failed to stop Jenkins: {status}")
            }
            UpdateEvent::StartingServer => "Starting Jenkins...".to_string(),
            UpdateEvent::ServerLaunched { pid: Some(pid) } => {
                format!("Jenkins started (pid {pid}).")
            }
            UpdateEvent::ServerLaunched { pid: None } => "Jenkins started.".to_string(),
            UpdateEvent::WaitingForServer => "Waiting for Jenkins to restart...".to_string(),
            UpdateEvent::ProbeFailed {
                attempt,
                max_attempts,
            } => format!("Waiting... ({attempt}/{max_attempts})"),
            UpdateEvent::ServerOnline { .. } => "Jenkins is back online!".to_string(),
            UpdateEvent::Verified { verdict } => verdict.description(),
        }
    }

    /// Whether the event reports a problem
    pub fn is_warning(&self) -> bool {
        match self {
            UpdateEvent::RestartRequestRejected { .. } => true,
            UpdateEvent::Verified { verdict } => !verdict.is_installed(),
            _ => false,
        }
    }
}

/// Outcome of the final verification query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The plugin is listed after restart
    Installed,
    /// The plugin is not listed after restart
    Missing,
    /// The listing could not be fetched
    Unknown(String),
}

impl Verdict {
    /// Whether the plugin was confirmed installed
    pub fn is_installed(&self) -> bool {
        matches!(self, Verdict::Installed)
    }

    /// Status line for the verdict
    pub fn description(&self) -> String {
        match self {
            Verdict::Installed => "Plugin successfully installed!".to_string(),
            Verdict::Missing => "Plugin installation failed!".to_string(),
            Verdict::Unknown(reason) => format!("Error checking installation: {reason}"),
        }
    }
}

/// Whether the uninstall step did anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// The plugin was not installed
    Skipped,
    /// The uninstall request was accepted
    Removed,
}

/// Summary of a run that reached the verification step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// What the uninstall step did
    pub uninstall: UninstallOutcome,
    /// Captured installer output
    pub install_output: String,
    /// Whether `/exit` answered 200
    pub restart_accepted: bool,
    /// Attempt on which the login probe answered 200
    pub ready_after_attempts: u32,
    /// Final verification result
    pub verdict: Verdict,
}
