//! The validated input to one update run

use crate::error::ConfigError;
use crate::settings::keys;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Everything needed to replace one plugin on one server.
///
/// Built once through [`UpdateRequest::builder`] and never mutated while
/// the pipeline runs.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    jenkins_url: String,
    cli_path: String,
    plugin_path: String,
    war_path: String,
    user: String,
    token: SecretString,
    plugin_name: String,
}

impl UpdateRequest {
    /// Create a builder
    pub fn builder() -> UpdateRequestBuilder {
        UpdateRequestBuilder::default()
    }

    /// Server base URL without a trailing slash
    pub fn jenkins_url(&self) -> &str {
        &self.jenkins_url
    }

    /// Path to `jenkins-cli.jar`
    pub fn cli_path(&self) -> &str {
        &self.cli_path
    }

    /// Path to the plugin artifact (`.hpi`/`.jpi`)
    pub fn plugin_path(&self) -> &str {
        &self.plugin_path
    }

    /// Path to `jenkins.war`, used to start the server again
    pub fn war_path(&self) -> &str {
        &self.war_path
    }

    /// User for Basic-Auth and the installer
    pub fn user(&self) -> &str {
        &self.user
    }

    /// API token for Basic-Auth and the installer
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Plugin short name, as listed by the plugin manager
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Absolute URL for a path relative to the server root
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.jenkins_url, path)
    }
}

/// Builder for [`UpdateRequest`]
#[derive(Debug, Default)]
pub struct UpdateRequestBuilder {
    jenkins_url: Option<String>,
    cli_path: Option<String>,
    plugin_path: Option<String>,
    war_path: Option<String>,
    user: Option<String>,
    token: Option<String>,
    plugin_name: Option<String>,
}

impl UpdateRequestBuilder {
    /// Set the server base URL
    pub fn jenkins_url(mut self, url: impl Into<String>) -> Self {
        self.jenkins_url = Some(url.into());
        self
    }

    /// Set the installer tool path
    pub fn cli_path(mut self, path: impl Into<String>) -> Self {
        self.cli_path = Some(path.into());
        self
    }

    /// Set the plugin artifact path
    pub fn plugin_path(mut self, path: impl Into<String>) -> Self {
        self.plugin_path = Some(path.into());
        self
    }

    /// Set the server restart artifact path
    pub fn war_path(mut self, path: impl Into<String>) -> Self {
        self.war_path = Some(path.into());
        self
    }

    /// Set the user
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the API token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the plugin short name
    pub fn plugin_name(mut self, name: impl Into<String>) -> Self {
        self.plugin_name = Some(name.into());
        self
    }

    /// Validate and build the request
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] listing every absent or empty value
    /// - [`ConfigError::InvalidUrl`] if the URL is not absolute http(s)
    /// - [`ConfigError::InvalidPluginName`] for names outside `[A-Za-z0-9._-]`
    pub fn build(self) -> Result<UpdateRequest, ConfigError> {
        let fields = [
            (keys::JENKINS_CLI_PATH, &self.cli_path),
            (keys::JENKINS_URL, &self.jenkins_url),
            (keys::JENKINS_USER, &self.user),
            (keys::JENKINS_TOKEN, &self.token),
            (keys::PLUGIN_NAME, &self.plugin_name),
            (keys::PLUGIN_PATH, &self.plugin_path),
            (keys::JENKINS_WAR_PATH, &self.war_path),
        ];
        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(key, _)| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let (
            Some(jenkins_url),
            Some(cli_path),
            Some(plugin_path),
            Some(war_path),
            Some(user),
            Some(token),
            Some(plugin_name),
        ) = (
            self.jenkins_url,
            self.cli_path,
            self.plugin_path,
            self.war_path,
            self.user,
            self.token,
            self.plugin_name,
        )
        else {
            return Err(ConfigError::Missing(Vec::new()));
        };

        Ok(UpdateRequest {
            jenkins_url: normalize_url(&jenkins_url)?,
            cli_path,
            plugin_path,
            war_path,
            user,
            token: SecretString::from(token),
            plugin_name: validate_plugin_name(plugin_name)?,
        })
    }
}

fn normalize_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let parsed = url::Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn validate_plugin_name(name: String) -> Result<String, ConfigError> {
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(name)
    } else {
        Err(ConfigError::InvalidPluginName(name))
    }
}

/// Fixed waits and limits of the pipeline.
///
/// The server gives no readiness signal for the plugin subsystem, so the
/// pipeline relies on these settle delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTimings {
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,

    /// Pause after uninstall, before running the installer
    pub post_uninstall_settle: Duration,

    /// Pause after the shutdown request, before launching the server
    pub post_shutdown_settle: Duration,

    /// Pause between readiness probes
    pub poll_interval: Duration,

    /// Maximum number of readiness probes
    pub poll_attempts: u32,

    /// Pause after the server is reachable, before verifying the plugin
    pub post_ready_settle: Duration,
}

impl Default for PipelineTimings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            post_uninstall_settle: Duration::from_secs(5),
            post_shutdown_settle: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            poll_attempts: 30,
            post_ready_settle: Duration::from_secs(10),
        }
    }
}

impl PipelineTimings {
    /// Timings with every delay set to zero, keeping the default limits
    pub fn immediate() -> Self {
        Self {
            post_uninstall_settle: Duration::ZERO,
            post_shutdown_settle: Duration::ZERO,
            poll_interval: Duration::ZERO,
            post_ready_settle: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
