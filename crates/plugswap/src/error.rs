//! Error types for the update pipeline
//!
//! Every fatal pipeline step has its own variant so callers can tell where
//! a run stopped. Non-fatal outcomes (a rejected restart request, a failed
//! verification) are not errors; they are reported through
//! [`UpdateEvent`](crate::UpdateEvent) and [`Verdict`](crate::Verdict).

use plugswap_transport::TransportError;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Fatal errors that abort the update pipeline.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The login page did not answer 200 before the pipeline started.
    #[error("Jenkins is not running at {url}")]
    Unreachable {
        /// Base URL that was probed
        url: String,
    },

    /// Listing installed plugins failed.
    #[error("failed to check plugin status: {0}")]
    Query(#[source] ControlError),

    /// The uninstall request failed or was rejected.
    #[error("failed to uninstall plugin: {0}")]
    Uninstall(#[source] ControlError),

    /// The installer could not be launched or exited non-zero.
    #[error("command execution failed: {reason}\nOutput: {output}")]
    Install {
        /// Launch error or exit status
        reason: String,
        /// Captured installer output
        output: String,
    },

    /// The shutdown request could not be delivered at all.
    #[error("failed to stop Jenkins: {0}")]
    RestartRequest(#[source] ControlError),

    /// The server process could not be spawned.
    #[error("failed to start Jenkins: {0}")]
    Launch(#[source] TransportError),

    /// The server did not answer the login probe within the poll budget.
    #[error("jenkins did not restart in time ({attempts} attempts)")]
    RestartTimeout {
        /// Number of probes made
        attempts: u32,
    },
}

/// Failures talking to the control API.
#[derive(Debug, Error)]
pub enum ControlError {
    /// No response was obtained (network error, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with something other than 200.
    #[error("{status}")]
    UnexpectedStatus {
        /// Status line text, e.g. `500 Internal Server Error`
        status: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Invalid or incomplete configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required values were not supplied by any source.
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    /// The server URL is not an absolute http(s) URL.
    #[error("invalid Jenkins URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected value
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The plugin identifier contains characters outside `[A-Za-z0-9._-]`.
    #[error("invalid plugin name '{0}'")]
    InvalidPluginName(String),

    /// A numeric setting was out of range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Setting name
        key: String,
        /// Why it was rejected
        reason: String,
    },
}
