//! Command lines for the Jenkins CLI installer and the server launch

use crate::request::UpdateRequest;
use plugswap_transport::ProcessConfig;

/// Default Java launcher
pub const DEFAULT_JAVA: &str = "java";

/// `java -jar <cli> -s <url> -auth <user>:<token> install-plugin file:///<artifact>`
pub fn install_command(java: &str, request: &UpdateRequest) -> ProcessConfig {
    ProcessConfig::new(java).with_args([
        "-jar".to_string(),
        request.cli_path().to_string(),
        "-s".to_string(),
        request.jenkins_url().to_string(),
        "-auth".to_string(),
        format!("{}:{}", request.user(), request.token()),
        "install-plugin".to_string(),
        format!("file:///{}", request.plugin_path()),
    ])
}

/// `java -jar <war>`
pub fn launch_command(java: &str, request: &UpdateRequest) -> ProcessConfig {
    ProcessConfig::new(java).with_args(["-jar", request.war_path()])
}

/// The install command line with the `-auth` credential masked, for logs
pub fn redacted_display(config: &ProcessConfig, request: &UpdateRequest) -> String {
    let masked = format!("{}:********", request.user());
    let mut after_auth = false;
    let args = config.args.iter().map(|arg| {
        let shown = if after_auth { masked.as_str() } else { arg.as_str() };
        after_auth = arg == "-auth";
        shown
    });

    std::iter::once(config.program.as_str())
        .chain(args)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UpdateRequest {
        UpdateRequest::builder()
            .jenkins_url("http://localhost:8080")
            .cli_path("/opt/jenkins/jenkins-cli.jar")
            .plugin_path("/build/target/my-plugin.hpi")
            .war_path("/opt/jenkins/jenkins.war")
            .user("admin")
            .token("1234567890abcdef")
            .plugin_name("my-plugin")
            .build()
            .unwrap()
    }

    #[test]
    fn test_install_command_is_byte_exact() {
        let config = install_command(DEFAULT_JAVA, &request());

        assert_eq!(config.program, "java");
        assert_eq!(
            config.args,
            vec![
                "-jar",
                "/opt/jenkins/jenkins-cli.jar",
                "-s",
                "http://localhost:8080",
                "-auth",
                "admin:1234567890abcdef",
                "install-plugin",
                "file:////build/target/my-plugin.hpi",
            ]
        );
    }

    #[test]
    fn test_separators_stay_inside_one_argument() {
        let request = UpdateRequest::builder()
            .jenkins_url("http://localhost:8080")
            .cli_path("C:\\jenkins\\jenkins-cli.jar")
            .plugin_path("C:\\work\\my plugin; rm -rf\\p.hpi")
            .war_path("C:\\jenkins\\jenkins.war")
            .user("ad min")
            .token("tok&en")
            .plugin_name("p")
            .build()
            .unwrap();

        let config = install_command("java", &request);

        assert_eq!(config.args.len(), 8);
        assert_eq!(config.args[5], "ad min:tok&en");
        assert_eq!(config.args[7], "file:///C:\\work\\my plugin; rm -rf\\p.hpi");
    }

    #[test]
    fn test_launch_command() {
        let config = launch_command("/usr/lib/jvm/bin/java", &request());
        assert_eq!(config.program, "/usr/lib/jvm/bin/java");
        assert_eq!(config.args, vec!["-jar", "/opt/jenkins/jenkins.war"]);
    }

    #[test]
    fn test_redacted_display_hides_token() {
        let request = request();
        let shown = redacted_display(&install_command("java", &request), &request);
        assert!(shown.contains("admin:********"));
        assert!(!shown.contains("1234567890abcdef"));
    }

    #[test]
    fn test_redaction_leaves_other_arguments_alone() {
        let request = UpdateRequest::builder()
            .jenkins_url("http://localhost:8080")
            .cli_path("/opt/jenkins/jenkins-cli.jar")
            .plugin_path("/build/8080/my-plugin.hpi")
            .war_path("/opt/jenkins/jenkins.war")
            .user("admin")
            .token("8080")
            .plugin_name("my-plugin")
            .build()
            .unwrap();

        let shown = redacted_display(&install_command("java", &request), &request);

        assert_eq!(
            shown,
            "java -jar /opt/jenkins/jenkins-cli.jar -s http://localhost:8080 \
             -auth admin:******** install-plugin file:////build/8080/my-plugin.hpi"
        );
    }
}
