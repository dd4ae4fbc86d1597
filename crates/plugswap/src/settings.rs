//! Command-line, environment and `.env` settings
//!
//! Values are merged with the precedence flag > process environment >
//! `.env` file. The merged values can be written back to the `.env` file so
//! later runs only need the flags that change.

use crate::error::ConfigError;
use crate::request::{PipelineTimings, UpdateRequest};
use clap::Parser;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Names of the seven required settings, as used in the environment and
/// the `.env` file.
pub mod keys {
    /// Path to `jenkins-cli.jar`
    pub const JENKINS_CLI_PATH: &str = "JENKINS_CLI_PATH";
    /// Server base URL
    pub const JENKINS_URL: &str = "JENKINS_URL";
    /// User name
    pub const JENKINS_USER: &str = "JENKINS_USER";
    /// API token
    pub const JENKINS_TOKEN: &str = "JENKINS_TOKEN";
    /// Plugin short name
    pub const PLUGIN_NAME: &str = "PLUGIN_NAME";
    /// Path to the plugin artifact
    pub const PLUGIN_PATH: &str = "PLUGIN_PATH";
    /// Path to `jenkins.war`
    pub const JENKINS_WAR_PATH: &str = "JENKINS_WAR_PATH";
}

const EXAMPLE: &str = "\
Example:
  plugswap --jenkins-cli-path /opt/jenkins/jenkins-cli.jar \\
           --jenkins-url http://localhost:8080 \\
           --jenkins-user admin --jenkins-token 1234567890abcdef \\
           --plugin-name my-plugin --plugin-path ./target/my-plugin.hpi \\
           --jenkins-war-path /opt/jenkins/jenkins.war

Every required value can also come from the environment or the .env file.";

/// Command-line surface of the `plugswap` binary.
#[derive(Debug, Parser)]
#[command(
    name = "plugswap",
    version,
    about = "Replace a plugin on a running Jenkins server and restart it",
    after_help = EXAMPLE
)]
pub struct Settings {
    /// Path to jenkins-cli.jar
    #[arg(long, env = "JENKINS_CLI_PATH")]
    pub jenkins_cli_path: Option<String>,

    /// Jenkins URL
    #[arg(long, env = "JENKINS_URL")]
    pub jenkins_url: Option<String>,

    /// Jenkins user
    #[arg(long, env = "JENKINS_USER")]
    pub jenkins_user: Option<String>,

    /// Jenkins API token
    #[arg(long, env = "JENKINS_TOKEN", hide_env_values = true)]
    pub jenkins_token: Option<String>,

    /// Plugin short name
    #[arg(long, env = "PLUGIN_NAME")]
    pub plugin_name: Option<String>,

    /// Path to the plugin file (.hpi/.jpi)
    #[arg(long, env = "PLUGIN_PATH")]
    pub plugin_path: Option<String>,

    /// Path to jenkins.war
    #[arg(long, env = "JENKINS_WAR_PATH")]
    pub jenkins_war_path: Option<String>,

    /// Java executable used for the installer and to start Jenkins
    #[arg(long, env = "PLUGSWAP_JAVA", default_value = "java")]
    pub java: String,

    /// Timeout for every HTTP request, in seconds
    #[arg(long, default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Maximum number of readiness probes after restart
    #[arg(long, default_value_t = 30)]
    pub poll_attempts: u32,

    /// Seconds between readiness probes
    #[arg(long, default_value_t = 2)]
    pub poll_interval_secs: u64,

    /// Settings file loaded at startup and updated with the merged values
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Do not write the merged values back to the settings file
    #[arg(long, default_value_t = false)]
    pub no_save: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,
}

impl Settings {
    /// Merge flag/environment values with values from the settings file.
    ///
    /// Only keys with a non-empty value are present in the result.
    pub fn merged_values(&self, file_values: &HashMap<String, String>) -> BTreeMap<String, String> {
        let parsed = [
            (keys::JENKINS_CLI_PATH, &self.jenkins_cli_path),
            (keys::JENKINS_URL, &self.jenkins_url),
            (keys::JENKINS_USER, &self.jenkins_user),
            (keys::JENKINS_TOKEN, &self.jenkins_token),
            (keys::PLUGIN_NAME, &self.plugin_name),
            (keys::PLUGIN_PATH, &self.plugin_path),
            (keys::JENKINS_WAR_PATH, &self.jenkins_war_path),
        ];

        parsed
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .clone()
                    .filter(|v| !v.is_empty())
                    .or_else(|| file_values.get(key).filter(|v| !v.is_empty()).cloned())
                    .map(|v| (key.to_string(), v))
            })
            .collect()
    }

    /// Timings derived from the tuning flags
    pub fn timings(&self) -> Result<PipelineTimings, ConfigError> {
        let timings = PipelineTimings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            poll_attempts: self.poll_attempts,
            ..Default::default()
        };
        timings.validate()?;
        Ok(timings)
    }

    /// Usage text including the example invocation
    pub fn usage() -> String {
        use clap::CommandFactory;
        Self::command().render_help().to_string()
    }
}

/// Build the request from merged values.
///
/// # Errors
///
/// Returns [`ConfigError::Missing`] naming every absent key, or a
/// validation error from [`UpdateRequest::builder`].
pub fn build_request(values: &BTreeMap<String, String>) -> Result<UpdateRequest, ConfigError> {
    let get = |key: &str| values.get(key).cloned().unwrap_or_default();

    UpdateRequest::builder()
        .cli_path(get(keys::JENKINS_CLI_PATH))
        .jenkins_url(get(keys::JENKINS_URL))
        .user(get(keys::JENKINS_USER))
        .token(get(keys::JENKINS_TOKEN))
        .plugin_name(get(keys::PLUGIN_NAME))
        .plugin_path(get(keys::PLUGIN_PATH))
        .war_path(get(keys::JENKINS_WAR_PATH))
        .build()
}

/// Read `KEY=value` pairs from a settings file without touching the
/// process environment.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>, dotenvy::Error> {
    dotenvy::from_path_iter(path)?.collect()
}

/// Write the values to a settings file, one `KEY='value'` line per key.
///
/// The file is replaced, not appended to.
pub fn save_env_file(path: &Path, values: &BTreeMap<String, String>) -> std::io::Result<()> {
    let contents: String = values
        .iter()
        .map(|(key, value)| format!("{key}={}\n", quote_value(value)))
        .collect();
    std::fs::write(path, contents)
}

fn quote_value(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$");
    format!("\"{escaped}\"")
}
