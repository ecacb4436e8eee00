//! Tests for executor spec parsing and the executor registry.

use rstest::rstest;
use zoracled::executor::{parse_executor, ExecutorError, ExecutorRegistry};

#[rstest]
#[case::lambda("lambda:https://example.com/execute", "lambda", "https://example.com/execute")]
#[case::cloud_function(
    "cloud-function:http://localhost:8080",
    "cloud-function",
    "http://localhost:8080"
)]
#[case::splits_at_first_colon("custom:a:b:c", "custom", "a:b:c")]
fn test_parse_executor(#[case] spec: &str, #[case] name: &str, #[case] url: &str) {
    assert_eq!(parse_executor(spec).unwrap(), (name, url));
}

#[rstest]
#[case::no_separator("lambda")]
#[case::empty_name(":https://example.com")]
#[case::empty_url("lambda:")]
#[case::empty("")]
fn test_parse_executor_rejects_malformed_specs(#[case] spec: &str) {
    assert!(matches!(parse_executor(spec), Err(ExecutorError::InvalidSpec(s)) if s == spec));
}

#[test]
fn test_default_registry_names() {
    let names: Vec<_> = ExecutorRegistry::default().names().collect();
    assert_eq!(names, vec!["cloud-function", "lambda"]);
    assert_eq!(ExecutorRegistry::empty().names().count(), 0);
}

#[test]
fn test_unknown_executor() {
    let err = ExecutorRegistry::default().create("docker:http://localhost:2375").unwrap_err();
    assert!(matches!(
        err,
        ExecutorError::UnknownExecutor { ref name, ref url }
            if name == "docker" && url == "http://localhost:2375"
    ));
}

#[test]
fn test_invalid_url() {
    let err = ExecutorRegistry::default().create("lambda:not a url").unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidUrl { .. }), "{err}");
}

#[test]
fn test_registered_executor_is_used() {
    fn lambda_only(
        url: reqwest::Url,
    ) -> Result<Box<dyn zoracled::executor::Executor>, ExecutorError> {
        Err(ExecutorError::InvalidUrl { url: url.to_string(), reason: "rejected".to_string() })
    }

    let registry = ExecutorRegistry::empty().register("strict", lambda_only);
    assert!(matches!(
        registry.create("strict:https://example.com"),
        Err(ExecutorError::InvalidUrl { ref reason, .. }) if reason == "rejected"
    ));
    assert!(matches!(
        registry.create("lambda:https://example.com"),
        Err(ExecutorError::UnknownExecutor { .. })
    ));
}
