//! Replace a plugin on a running Jenkins server
//!
//! `plugswap` drives one Jenkins controller through a fixed sequence:
//! uninstall the plugin if it is present, install a local `.hpi`/`.jpi`
//! through the Jenkins CLI, stop the server, launch it again from
//! `jenkins.war`, wait for it to come back, and check the plugin is listed.
//!
//! # Architecture
//!
//! 1. **Transport Layer** (`plugswap-transport`): HTTP and process plumbing
//! 2. **Control Layer** ([`control`]): the Jenkins endpoints the pipeline uses
//! 3. **Pipeline** ([`updater`]): step ordering, waits, and the verdict
//!
//! # Usage Example
//!
//! ```ignore
//! use plugswap::{PipelineTimings, TokioSleeper, UpdateRequest, Updater};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let request = UpdateRequest::builder()
//!         .jenkins_url("http://localhost:8080")
//!         .cli_path("/opt/jenkins/jenkins-cli.jar")
//!         .plugin_path("target/my-plugin.hpi")
//!         .war_path("/opt/jenkins/jenkins.war")
//!         .user("admin")
//!         .token("1234567890abcdef")
//!         .plugin_name("my-plugin")
//!         .build()?;
//!
//!     let report = Updater::connect(request, PipelineTimings::default(), TokioSleeper)?
//!         .on_event(|event| println!("{}", event.description()))
//!         .run()
//!         .await?;
//!
//!     println!("{}", report.verdict.description());
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod control;
pub mod error;
pub mod events;
pub mod installer;
pub mod request;
pub mod settings;
pub mod testing;
pub mod updater;

// Re-export commonly used types
pub use clock::{Sleeper, TokioSleeper};
pub use control::ControlClient;
pub use error::{ConfigError, ControlError, Result, UpdateError};
pub use events::{SettleReason, UninstallOutcome, UpdateEvent, UpdateReport, Verdict};
pub use request::{PipelineTimings, UpdateRequest, UpdateRequestBuilder};
pub use updater::{EventCallback, Updater};
