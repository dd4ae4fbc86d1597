//! Integration tests for HTTP transport

use std::time::Duration;

use plugswap_transport::{HttpRequest, HttpTransport, HttpTransportConfig, Transport, TransportError};
use rstest::rstest;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_http_request_builder() {
    let request = HttpRequest::post("https://example.com/exit")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_basic_auth("admin", "token");

    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "https://example.com/exit");
    assert_eq!(request.headers.len(), 2);
    assert!(request.body.is_none());
}

#[tokio::test]
async fn test_sends_basic_auth_and_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pluginManager/api/json"))
        .and(query_param("depth", "1"))
        .and(header("Authorization", "Basic YWRtaW46dG9rZW4="))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"plugins":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().expect("Failed to create HTTP transport");
    let request = HttpRequest::get(format!("{}/pluginManager/api/json?depth=1", server.uri()))
        .with_basic_auth("admin", "token");

    let response = transport.send_http(request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, br#"{"plugins":[]}"#.to_vec());
}

#[tokio::test]
async fn test_sends_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(body_string("a=b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let request = HttpRequest::post(format!("{}/echo", server.uri())).with_body(b"a=b".to_vec());

    let response = transport.send_http(request).await.unwrap();
    assert!(response.is_ok());
}

#[rstest]
#[case(200)]
#[case(302)]
#[case(404)]
#[case(503)]
#[tokio::test]
async fn test_any_status_is_a_response(#[case] status: u16) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let response = transport
        .send_http(HttpRequest::get(format!("{}/login", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, status);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport =
        HttpTransport::with_config(HttpTransportConfig::with_timeout(Duration::from_millis(200)))
            .unwrap();
    let result = transport
        .send_http(HttpRequest::get(format!("{}/login", server.uri())))
        .await;

    assert!(matches!(result, Err(TransportError::Timeout)));
}

#[tokio::test]
async fn test_refused_connection_is_connection_error() {
    // Nothing listens on a port once its listener is dropped.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let transport = HttpTransport::new().unwrap();
    let result = transport
        .send_http(HttpRequest::get(format!("http://127.0.0.1:{port}/login")))
        .await;

    assert!(matches!(result, Err(TransportError::Connection(_))));
}
