//! Tests for the REST executors against a mock function host.

use std::time::Duration;

use reqwest::Url;
use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, MockServer, ResponseTemplate,
};
use zoracled::executor::{
    ExecutionOutput, Executor, ExecutorRegistry, RestExecutor, RestFlavor, EXECUTION_ERROR_CODE,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn executor(flavor: RestFlavor, server: &MockServer) -> RestExecutor {
    let url = Url::parse(&format!("{}/execute", server.uri())).unwrap();
    RestExecutor::new(flavor, url).unwrap()
}

#[tokio::test]
async fn test_lambda_posts_executable_and_returns_stdout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .and(body_json(json!({
            "executable": "#!/bin/sh\necho $1",
            "calldata": "BTC",
            "timeout": 5000,
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "returncode": 0, "stdout": "42000", "stderr": "" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = executor(RestFlavor::Lambda, &server)
        .execute(b"#!/bin/sh\necho $1", "BTC", TIMEOUT)
        .await;
    assert_eq!(output, ExecutionOutput::new(&b"42000"[..], 0));
    assert!(output.is_success());
}

#[tokio::test]
async fn test_cloud_function_sends_base64_executable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({ "executable": "IyEvYmluL3No", "calldata": "", "timeout": 5000 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "returncode": 0, "stdout": "ok" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = executor(RestFlavor::CloudFunction, &server).execute(b"#!/bin/sh", "", TIMEOUT).await;
    assert_eq!(output, ExecutionOutput::new(&b"ok"[..], 0));
}

#[tokio::test]
async fn test_non_zero_exit_returns_stderr() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "returncode": 3,
            "stdout": "partial",
            "stderr": "symbol not found",
        })))
        .mount(&server)
        .await;

    let output = executor(RestFlavor::Lambda, &server).execute(b"x", "", TIMEOUT).await;
    assert_eq!(output, ExecutionOutput::new(&b"symbol not found"[..], 3));
    assert!(!output.is_success());
}

#[tokio::test]
async fn test_http_error_becomes_execution_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

    let output = executor(RestFlavor::Lambda, &server).execute(b"x", "", TIMEOUT).await;
    assert_eq!(output, ExecutionOutput::execution_error());
    assert_eq!(output.exit_code, EXECUTION_ERROR_CODE);
}

#[tokio::test]
async fn test_malformed_response_becomes_execution_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let output = executor(RestFlavor::Lambda, &server).execute(b"x", "", TIMEOUT).await;
    assert_eq!(output, ExecutionOutput::execution_error());
}

#[tokio::test]
async fn test_slow_host_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "returncode": 0, "stdout": "late" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let output = executor(RestFlavor::Lambda, &server)
        .execute(b"x", "", Duration::from_millis(100))
        .await;
    assert_eq!(output, ExecutionOutput::execution_error());
}

#[tokio::test]
async fn test_registry_builds_working_executor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "returncode": 0, "stdout": "1" })),
        )
        .mount(&server)
        .await;

    let executor = ExecutorRegistry::default().create(&format!("lambda:{}/run", server.uri())).unwrap();
    assert_eq!(executor.name(), "lambda");
    assert_eq!(executor.execute(b"x", "", TIMEOUT).await, ExecutionOutput::new(&b"1"[..], 0));
}
