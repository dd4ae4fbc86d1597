use clap::Parser;
use plugswap::settings::{self, Settings};
use plugswap::{ConfigError, Sleeper, TokioSleeper, Updater};
use std::collections::HashMap;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_telemetry(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_file_values(settings: &Settings) -> HashMap<String, String> {
    match settings::load_env_file(&settings.env_file) {
        Ok(values) => values,
        Err(err) if err.not_found() => {
            warn!(path = %settings.env_file.display(), "settings file not found");
            HashMap::new()
        }
        Err(err) => {
            warn!(path = %settings.env_file.display(), error = %err, "could not read settings file");
            HashMap::new()
        }
    }
}

fn report_config_error(err: &ConfigError) {
    eprintln!("Error: {err}");
    if matches!(err, ConfigError::Missing(_)) {
        eprintln!("All flags are required (or set them in the environment or .env file).\n");
        eprintln!("{}", Settings::usage());
    }
}

/// Run one update with the given settings and map the outcome to an exit code.
///
/// Exits 1 on incomplete configuration or a fatal step. A finished run exits
/// 0 whatever the verdict.
async fn run<S: Sleeper>(settings: &Settings, sleeper: S) -> anyhow::Result<ExitCode> {
    let values = settings.merged_values(&load_file_values(settings));
    if !settings.no_save
        && let Err(err) = settings::save_env_file(&settings.env_file, &values)
    {
        warn!(path = %settings.env_file.display(), error = %err, "could not save settings");
    }

    let request = match settings::build_request(&values) {
        Ok(request) => request,
        Err(err) => {
            report_config_error(&err);
            return Ok(ExitCode::FAILURE);
        }
    };
    let timings = match settings.timings() {
        Ok(timings) => timings,
        Err(err) => {
            report_config_error(&err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let updater = Updater::connect(request, timings, sleeper)?
        .with_java(settings.java.as_str())
        .on_event(|event| {
            if event.is_warning() {
                eprintln!("{}", event.description());
            } else {
                println!("{}", event.description());
            }
        });

    match updater.run().await {
        Ok(report) => {
            info!(
                verdict = ?report.verdict,
                attempts = report.ready_after_attempts,
                "update finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let settings = Settings::parse();
    init_telemetry(&settings);

    info!(version = env!("CARGO_PKG_VERSION"), "plugswap starting");

    run(&settings, TokioSleeper).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugswap::testing::RecordingSleeper;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ALL_UNSET: [(&str, Option<&str>); 8] = [
        ("JENKINS_CLI_PATH", None),
        ("JENKINS_URL", None),
        ("JENKINS_USER", None),
        ("JENKINS_TOKEN", None),
        ("PLUGIN_NAME", None),
        ("PLUGIN_PATH", None),
        ("JENKINS_WAR_PATH", None),
        ("PLUGSWAP_JAVA", None),
    ];

    fn parse(dir: &tempfile::TempDir, args: &[&str]) -> Settings {
        let env_file = dir.path().join(".env");
        let env_file = env_file.to_string_lossy().into_owned();
        let mut argv = vec!["plugswap", "--no-save", "--env-file", env_file.as_str()];
        argv.extend_from_slice(args);
        temp_env::with_vars(ALL_UNSET, || Settings::try_parse_from(argv.iter().copied()).unwrap())
    }

    fn complete_args<'a>(url: &'a str, java: &'a str) -> Vec<&'a str> {
        vec![
            "--jenkins-url",
            url,
            "--jenkins-cli-path",
            "/opt/jenkins/jenkins-cli.jar",
            "--jenkins-user",
            "admin",
            "--jenkins-token",
            "token",
            "--plugin-name",
            "my-plugin",
            "--plugin-path",
            "/build/my-plugin.hpi",
            "--jenkins-war-path",
            "/opt/jenkins/jenkins.war",
            "--java",
            java,
        ]
    }

    #[tokio::test]
    async fn test_missing_configuration_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let settings = parse(&dir, &["--jenkins-url", "http://localhost:8080"]);

        let code = run(&settings, RecordingSleeper::new()).await.unwrap();

        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn test_unreachable_server_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let settings = parse(&dir, &complete_args("http://127.0.0.1:1", "java"));

        let code = run(&settings, RecordingSleeper::new()).await.unwrap();

        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn test_fatal_step_exits_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pluginManager/api/json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let uri = server.uri();
        let settings = parse(&dir, &complete_args(&uri, "java"));

        let code = run(&settings, RecordingSleeper::new()).await.unwrap();

        assert_eq!(code, ExitCode::FAILURE);
    }

    // `true` stands in for java: the installer exits 0 and the launch returns at once.
    #[cfg(unix)]
    #[rstest::rstest]
    #[case(&["my-plugin"])]
    #[case(&[])]
    #[tokio::test]
    async fn test_finished_run_exits_zero_whatever_the_verdict(#[case] listed: &[&str]) {
        let server = MockServer::start().await;
        let plugins: Vec<_> = listed.iter().map(|name| json!({"shortName": name})).collect();
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pluginManager/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"plugins": plugins})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let uri = server.uri();
        let settings = parse(&dir, &complete_args(&uri, "true"));

        let code = run(&settings, RecordingSleeper::new()).await.unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
    }
}
