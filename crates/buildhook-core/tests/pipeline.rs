use std::collections::BTreeMap;
use std::time::Duration;

use buildhook::config::{HttpConfig, NotificationConfig};
use buildhook::models::{BuildInfo, BuildResult, HostInfo};
use buildhook::notify::{
    BuildLog, ConsoleLog, DeliveryClient, Notifier, RunOutcome, SkipReason, TemplateRenderer,
    JSON_CONTENT_TYPE,
};
use buildhook::resources::Resources;
use buildhook::Error;
use pretty_assertions::assert_eq;
use rstest::rstest;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingLog {
    info: Vec<String>,
    errors: Vec<String>,
}

impl BuildLog for RecordingLog {
    fn info(&mut self, line: &str) {
        self.info.push(line.to_string());
    }

    fn error(&mut self, line: &str) {
        self.errors.push(line.to_string());
    }
}

fn host() -> HostInfo {
    HostInfo {
        name: "ci".to_string(),
        root_url: Some("https://ci.example.com/".to_string()),
        version: "0.1.0".to_string(),
    }
}

fn build(result: BuildResult, url: &str) -> BuildInfo {
    BuildInfo {
        job_name: "api".to_string(),
        number: 42,
        display_name: "#42".to_string(),
        url: url.to_string(),
        result,
        duration_ms: 1500,
        started_at: None,
        description: None,
    }
}

fn success() -> BuildInfo {
    build(BuildResult::Success, "job/api/42/")
}

fn notifier_with(url: Option<&str>, template: Option<&str>, http: &HttpConfig, host: Option<HostInfo>) -> Notifier {
    let resources = Resources::embedded().unwrap();
    Notifier::new(
        NotificationConfig::new(url, template, resources.default_template()),
        TemplateRenderer::new(resources.prelude()),
        DeliveryClient::new(http).unwrap(),
        host,
    )
}

fn notifier(url: Option<&str>, template: Option<&str>) -> Notifier {
    notifier_with(url, template, &HttpConfig::default(), Some(host()))
}

async fn hook(status: u16, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

async fn sent_bodies(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|request| String::from_utf8(request.body).unwrap())
        .collect()
}

#[rstest]
#[case::unstable(BuildResult::Unstable, "job/api/42/", true)]
#[case::failure(BuildResult::Failure, "job/api/42/", true)]
#[case::aborted(BuildResult::Aborted, "job/api/42/", true)]
#[case::not_built(BuildResult::NotBuilt, "job/api/42/", true)]
#[case::intermediate(BuildResult::Success, "job/matrix/axis=$axis/42/", true)]
#[case::no_url(BuildResult::Success, "job/api/42/", false)]
#[tokio::test]
async fn test_not_applicable_is_silent_success(
    #[case] result: BuildResult,
    #[case] build_url: &str,
    #[case] with_url: bool,
) {
    let server = hook(200, 0).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier(with_url.then_some(url.as_str()), None);
    let mut log = RecordingLog::default();

    let outcome = notifier
        .run(&build(result, build_url), &mut log, &BTreeMap::new())
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Skipped(_)));
    assert!(log.errors.is_empty());
    assert!(log.info.is_empty());
}

#[tokio::test]
async fn test_skip_reasons() {
    let notifier = notifier(None, None);
    let mut log = RecordingLog::default();
    let env = BTreeMap::new();

    let outcome = notifier.run(&success(), &mut log, &env).await.unwrap();
    assert_eq!(outcome, RunOutcome::Skipped(SkipReason::NoUrl));

    let notifier = self::notifier(Some("http://127.0.0.1:1/hook"), None);
    let outcome = notifier
        .run(&build(BuildResult::Unstable, "job/api/42/"), &mut log, &env)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Skipped(SkipReason::Result(BuildResult::Unstable))
    );

    let outcome = notifier
        .run(&build(BuildResult::Success, "job/m/x=$x/1/"), &mut log, &env)
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::Skipped(SkipReason::Intermediate));
}

#[tokio::test]
async fn test_perform_returns_true_on_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", JSON_CONTENT_TYPE))
        .respond_with(ResponseTemplate::new(200).set_body_string("ignored"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/hook", server.uri());
    let notifier = notifier(Some(&url), Some(r#"{"job": {{ json(build.job_name) }}}"#));
    let mut log = RecordingLog::default();

    let proceed = notifier
        .perform(&success(), &mut log, &BTreeMap::new())
        .await
        .unwrap();

    assert!(proceed);
    assert_eq!(sent_bodies(&server).await, vec![r#"{"job": "api"}"#.to_string()]);
    assert_eq!(
        log.info,
        vec![
            "Building notify JSON payload".to_string(),
            format!("Publishing notify JSON payload to {url}"),
        ]
    );
    assert!(log.errors.is_empty());
}

#[tokio::test]
async fn test_non_json_never_reaches_endpoint() {
    let server = hook(200, 0).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier(Some(&url), Some("not-json-at-all"));
    let mut log = RecordingLog::default();

    let err = notifier
        .perform(&success(), &mut log, &BTreeMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert!(err.to_string().contains("not-json-at-all"));
    assert_eq!(log.errors.len(), 1);
    assert!(log.errors[0].contains("should start and end with {} or []"));
}

#[tokio::test]
async fn test_surrounding_whitespace_is_trimmed() {
    let server = hook(200, 1).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier(Some(&url), Some(r#"{{ "  " }}{"a":1}{{ "  " }}"#));

    notifier
        .perform(&success(), &mut RecordingLog::default(), &BTreeMap::new())
        .await
        .unwrap();

    assert_eq!(sent_bodies(&server).await, vec![r#"{"a":1}"#.to_string()]);
}

#[tokio::test]
async fn test_array_payload_accepted() {
    let server = hook(200, 1).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier(Some(&url), Some("[1,2,3]"));

    notifier
        .perform(&success(), &mut RecordingLog::default(), &BTreeMap::new())
        .await
        .unwrap();

    assert_eq!(sent_bodies(&server).await, vec!["[1,2,3]".to_string()]);
}

#[tokio::test]
async fn test_mismatched_envelope_rejected() {
    let server = hook(200, 0).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier(Some(&url), Some(r#"{"a":1]"#));
    let mut log = RecordingLog::default();

    let err = notifier
        .perform(&success(), &mut log, &BTreeMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(log.errors.len(), 1);
}

#[tokio::test]
async fn test_server_error_is_delivery_fault() {
    let server = hook(500, 1).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier(Some(&url), Some(r#"{"n": {{ build.number }}}"#));
    let mut log = RecordingLog::default();

    let err = notifier
        .perform(&success(), &mut log, &BTreeMap::new())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, Error::Delivery { .. }));
    assert!(message.contains(&url));
    assert!(message.contains(r#"{"n": 42}"#));
    assert_eq!(log.errors.len(), 1);
    assert!(log.errors[0].contains("status code is 500, expected 200"));
    // Exactly one attempt; the mock's expectation is verified on drop.
    assert_eq!(sent_bodies(&server).await.len(), 1);
}

#[tokio::test]
async fn test_non_200_success_status_is_rejected() {
    let server = hook(204, 1).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier(Some(&url), Some("{}"));

    let err = notifier
        .perform(&success(), &mut RecordingLog::default(), &BTreeMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Delivery { .. }));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_delivery_fault() {
    let notifier = notifier(Some("http://127.0.0.1:1/hook"), Some("{}"));
    let mut log = RecordingLog::default();

    let err = notifier
        .perform(&success(), &mut log, &BTreeMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Delivery { .. }));
    assert!(err.to_string().contains("http://127.0.0.1:1/hook"));
    assert_eq!(log.errors.len(), 1);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let http = HttpConfig {
        connect_timeout: Duration::from_millis(200),
        read_timeout: Duration::from_millis(200),
        request_timeout: Duration::from_millis(200),
    };
    let url = format!("{}/hook", server.uri());
    let notifier = notifier_with(Some(&url), Some("{}"), &http, Some(host()));

    let err = notifier
        .perform(&success(), &mut RecordingLog::default(), &BTreeMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Delivery { .. }));
}

#[tokio::test]
async fn test_missing_host_is_logged_and_raised() {
    let server = hook(200, 0).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier_with(Some(&url), Some("{}"), &HttpConfig::default(), None);
    let mut log = RecordingLog::default();

    let err = notifier
        .perform(&success(), &mut log, &BTreeMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(log.errors, vec![err.to_string()]);
}

#[tokio::test]
async fn test_broken_template_is_render_fault() {
    let server = hook(200, 0).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier(Some(&url), Some("{% if %}"));
    let mut log = RecordingLog::default();

    let err = notifier
        .perform(&success(), &mut log, &BTreeMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Render { .. }));
    assert!(err.to_string().contains("{% if %}"));
    assert_eq!(log.errors.len(), 1);
}

#[tokio::test]
async fn test_default_template_delivered() {
    let server = hook(200, 1).await;
    let url = format!("{}/hook", server.uri());
    let notifier = notifier(Some(&url), None);
    let env = BTreeMap::from([("GIT_BRANCH".to_string(), "main".to_string())]);

    notifier
        .perform(&success(), &mut RecordingLog::default(), &env)
        .await
        .unwrap();

    let bodies = sent_bodies(&server).await;
    let value: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(value["name"], "api");
    assert_eq!(value["number"], 42);
    assert_eq!(value["result"], "SUCCESS");
    assert_eq!(value["env"]["GIT_BRANCH"], "main");
    assert_eq!(value["host"]["name"], "ci");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_runs_share_one_client() {
    let server = hook(200, 2).await;
    let url = format!("{}/hook", server.uri());
    let resources = Resources::embedded().unwrap();
    let client = DeliveryClient::new(&HttpConfig::default()).unwrap();

    let handles: Vec<_> = [1u64, 2]
        .into_iter()
        .map(|number| {
            let notifier = Notifier::new(
                NotificationConfig::new(
                    Some(&url),
                    Some(r#"{"n": {{ build.number }}}"#),
                    resources.default_template(),
                ),
                TemplateRenderer::new(resources.prelude()),
                client.clone(),
                Some(host()),
            );

            tokio::spawn(async move {
                let build = BuildInfo {
                    number,
                    ..success()
                };
                let mut log = ConsoleLog::new(Vec::new());
                notifier.perform(&build, &mut log, &BTreeMap::new()).await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    let mut bodies = sent_bodies(&server).await;
    bodies.sort();
    assert_eq!(
        bodies,
        vec![r#"{"n": 1}"#.to_string(), r#"{"n": 2}"#.to_string()]
    );
}
