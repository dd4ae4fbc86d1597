//! Fixtures shared by the pipeline and control API tests
//!
//! Each test starts a `wiremock` server standing in for Jenkins and talks
//! to it through the real reqwest transport. Processes and sleeps are
//! replaced with the recording doubles from `plugswap::testing`.

#![allow(dead_code)]

use plugswap::testing::{MockProcessInvoker, RecordingSleeper};
use plugswap::{PipelineTimings, UpdateEvent, UpdateRequest, Updater};
use plugswap_transport::{HttpTransport, HttpTransportConfig};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const PLUGIN: &str = "my-plugin";
pub const AUTH: &str = "Basic YWRtaW46dG9rZW4=";

pub fn request_for(server: &MockServer) -> UpdateRequest {
    UpdateRequest::builder()
        .jenkins_url(server.uri())
        .cli_path("/opt/jenkins/jenkins-cli.jar")
        .plugin_path("/build/target/my-plugin.hpi")
        .war_path("/opt/jenkins/jenkins.war")
        .user("admin")
        .token("token")
        .plugin_name(PLUGIN)
        .build()
        .expect("valid request")
}

pub fn transport() -> HttpTransport {
    HttpTransport::with_config(HttpTransportConfig::with_timeout(Duration::from_secs(2)))
        .expect("Failed to create HTTP transport")
}

/// Pipeline wired to the mock server, with recorded processes, sleeps and events
pub struct Harness {
    pub updater: Updater<HttpTransport, MockProcessInvoker, RecordingSleeper>,
    pub processes: MockProcessInvoker,
    pub sleeper: RecordingSleeper,
    pub events: Arc<Mutex<Vec<UpdateEvent>>>,
}

impl Harness {
    pub fn new(server: &MockServer) -> Self {
        Self::with_processes(server, MockProcessInvoker::new())
    }

    pub fn with_processes(server: &MockServer, processes: MockProcessInvoker) -> Self {
        let sleeper = RecordingSleeper::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let updater = Updater::new(
            request_for(server),
            PipelineTimings::default(),
            transport(),
            processes.clone(),
            sleeper.clone(),
        )
        .on_event(move |event| sink.lock().unwrap().push(event.clone()));

        Self {
            updater,
            processes,
            sleeper,
            events,
        }
    }

    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().unwrap().clone()
    }
}

pub fn plugin_list(names: &[&str]) -> ResponseTemplate {
    let plugins: Vec<_> = names
        .iter()
        .map(|name| json!({"shortName": name, "version": "1.0", "active": true}))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "_class": "hudson.LocalPluginManager",
        "plugins": plugins,
    }))
}

/// `GET /login` answering `status` for the next `times` requests
pub async fn mount_login(server: &MockServer, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// `GET /login` answering `status` from now on
pub async fn mount_login_forever(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Authenticated plugin listing answering `response` for the next `times` requests
pub async fn mount_plugin_list(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/pluginManager/api/json"))
        .and(query_param("depth", "1"))
        .and(header("Authorization", AUTH))
        .respond_with(response)
        .up_to_n_times(times)
        .mount(server)
        .await;
}

pub async fn mount_uninstall(server: &MockServer, status: u16, expected: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/pluginManager/plugin/{PLUGIN}/doUninstall")))
        .and(header("Authorization", AUTH))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn mount_exit(server: &MockServer, status: u16, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/exit"))
        .and(header("Authorization", AUTH))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn received(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}

pub async fn count_requests(server: &MockServer, verb: &str, url_path: &str) -> usize {
    received(server)
        .await
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == url_path)
        .count()
}
