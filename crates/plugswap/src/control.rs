//! Client for the Jenkins HTTP control API
//!
//! Wraps a [`Transport`] with the four endpoints the pipeline uses. The
//! login probe is unauthenticated; everything else sends Basic-Auth with
//! the request's user and token.

use crate::error::ControlError;
use crate::request::UpdateRequest;
use plugswap_transport::{HttpRequest, HttpResponse, Transport};
use serde::Deserialize;

const LOGIN_PATH: &str = "/login";
const PLUGIN_LIST_PATH: &str = "/pluginManager/api/json?depth=1";
const EXIT_PATH: &str = "/exit";

/// Response of `/pluginManager/api/json`
#[derive(Debug, Deserialize)]
struct PluginList {
    #[serde(default)]
    plugins: Vec<PluginEntry>,
}

#[derive(Debug, Deserialize)]
struct PluginEntry {
    #[serde(rename = "shortName", default)]
    short_name: String,
}

/// Control API client bound to one server and credential pair.
#[derive(Debug, Clone)]
pub struct ControlClient<T> {
    transport: T,
    request: UpdateRequest,
}

impl<T: Transport> ControlClient<T> {
    /// Create a client for the server named in `request`
    pub fn new(transport: T, request: UpdateRequest) -> Self {
        Self { transport, request }
    }

    /// Whether the login page answers exactly 200.
    ///
    /// Transport failures and every other status count as unreachable.
    pub async fn is_reachable(&self) -> bool {
        let probe = HttpRequest::get(self.request.endpoint(LOGIN_PATH));
        match self.transport.send_http(probe).await {
            Ok(response) => {
                tracing::debug!(status = response.status, "login probe");
                response.is_ok()
            }
            Err(err) => {
                tracing::debug!(error = %err, "login probe failed");
                false
            }
        }
    }

    /// Short names of all installed plugins
    pub async fn installed_plugins(&self) -> Result<Vec<String>, ControlError> {
        let request = self.authenticated(HttpRequest::get(self.request.endpoint(PLUGIN_LIST_PATH)));
        let response = expect_ok(self.transport.send_http(request).await?)?;

        let list: PluginList = serde_json::from_slice(&response.body)
            .map_err(|e| ControlError::Decode(e.to_string()))?;

        Ok(list.plugins.into_iter().map(|p| p.short_name).collect())
    }

    /// Whether `plugin_name` is in the installed plugin list
    pub async fn is_installed(&self, plugin_name: &str) -> Result<bool, ControlError> {
        let plugins = self.installed_plugins().await?;
        Ok(plugins.iter().any(|name| name == plugin_name))
    }

    /// Ask the plugin manager to uninstall `plugin_name`
    pub async fn uninstall(&self, plugin_name: &str) -> Result<(), ControlError> {
        let url = self
            .request
            .endpoint(&format!("/pluginManager/plugin/{plugin_name}/doUninstall"));
        let request = self.authenticated(
            HttpRequest::post(url).with_header("Content-Type", "application/x-www-form-urlencoded"),
        );

        expect_ok(self.transport.send_http(request).await?)?;
        Ok(())
    }

    /// Ask the server to shut down
    pub async fn request_exit(&self) -> Result<(), ControlError> {
        let request = self.authenticated(HttpRequest::post(self.request.endpoint(EXIT_PATH)));
        expect_ok(self.transport.send_http(request).await?)?;
        Ok(())
    }

    fn authenticated(&self, request: HttpRequest) -> HttpRequest {
        request.with_basic_auth(self.request.user(), self.request.token())
    }
}

fn expect_ok(response: HttpResponse) -> Result<HttpResponse, ControlError> {
    if response.is_ok() {
        Ok(response)
    } else {
        Err(ControlError::UnexpectedStatus {
            status: response.status_text(),
        })
    }
}
