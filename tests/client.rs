use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use gogi::{ClientConfig, Error, GitignoreClient, DEFAULT_USER_AGENT};
use mockito::Server;
use tokio::net::TcpListener;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Dispatch, Event, Level, Metadata, Subscriber};

const TEST_AGENT: &str = "test/agent";
const LIST_BODY: &str = "actionscript,ada,c,c++\ngo,java,rust\nmacos,windows\n";

fn client_for(server: &Server) -> GitignoreClient {
    GitignoreClient::new(ClientConfig::new(TEST_AGENT, server.url())).unwrap()
}

fn framed(uri: &str, sections: &str) -> String {
    format!(
        "\n# Created by {uri}\n# Edit at {uri}\n\n{sections}\n# End of {uri}\n",
        uri = uri,
        sections = sections
    )
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    fields: HashMap<String, String>,
}

#[derive(Default)]
struct FieldCollector(HashMap<String, String>);

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

/// Subscriber that keeps every event it receives.
#[derive(Clone, Default)]
struct CaptureSubscriber {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureSubscriber {
    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Subscriber for CaptureSubscriber {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            fields: collector.0,
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

#[tokio::test]
async fn list_returns_sorted_identifiers() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/list")
        .match_header("user-agent", TEST_AGENT)
        .with_status(200)
        .with_body("rust,Java\ngo,c\nmacos\n")
        .create_async()
        .await;

    let types = client_for(&server).list().await.unwrap();

    mock.assert_async().await;
    assert_eq!(types, ["c", "go", "java", "macos", "rust"]);
}

#[tokio::test]
async fn list_contains_go_and_java_without_duplicates() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/list")
        .with_body(LIST_BODY)
        .create_async()
        .await;

    let types = client_for(&server).list().await.unwrap();

    assert!(types.iter().any(|t| t == "go"));
    assert!(types.iter().any(|t| t == "java"));
    let mut deduped = types.clone();
    deduped.dedup();
    assert_eq!(deduped, types);
    assert!(types.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn list_rejects_unexpected_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/list")
        .with_status(503)
        .with_body("<html><body>Service Unavailable</body></html>")
        .create_async()
        .await;

    let err = client_for(&server).list().await.unwrap_err();

    assert!(matches!(err, Error::ResponseFormat { .. }));
    assert_eq!(err.uri(), Some(format!("{}/api/list", server.url()).as_str()));
}

#[tokio::test]
async fn list_against_unreachable_host_is_a_transport_error() {
    let client = GitignoreClient::new(ClientConfig::new(TEST_AGENT, "http://127.0.0.1:1")).unwrap();

    let result = client.list().await;

    assert!(matches!(result, Err(Error::Transport { .. })));
}

#[tokio::test]
async fn default_user_agent_is_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/list")
        .match_header("user-agent", DEFAULT_USER_AGENT)
        .with_body(LIST_BODY)
        .create_async()
        .await;

    let client = GitignoreClient::new(ClientConfig::new("", server.url())).unwrap();
    client.list().await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn get_returns_framed_content_unmodified() {
    let mut server = Server::new_async().await;
    let uri = format!("{}/api/go,java", server.url());
    let body = framed(&uri, "### Go ###\n*.test\n\n### Java ###\n*.class\n");
    let mock = server
        .mock("GET", "/api/go,java")
        .match_header("user-agent", TEST_AGENT)
        .with_body(&body)
        .create_async()
        .await;

    let content = client_for(&server).get(&["java", "go"]).await.unwrap();

    mock.assert_async().await;
    assert_eq!(content, body.as_bytes());
    let text = String::from_utf8(content).unwrap();
    assert!(text.contains("go,java"));
    assert!(text.contains("End of"));
}

#[tokio::test]
async fn get_canonicalizes_identifier_case() {
    let mut server = Server::new_async().await;
    let uri = format!("{}/api/go,rust", server.url());
    let mock = server
        .mock("GET", "/api/go,rust")
        .with_body(framed(&uri, "/target\n"))
        .create_async()
        .await;

    let content = client_for(&server).get(&["Rust", "GO"]).await;

    mock.assert_async().await;
    assert!(content.is_ok());
}

#[tokio::test]
async fn get_rejects_body_without_end_marker() {
    let mut server = Server::new_async().await;
    let uri = format!("{}/api/go", server.url());
    let _mock = server
        .mock("GET", "/api/go")
        .with_body(format!("# Created by {}\n*.test\n", uri))
        .create_async()
        .await;

    let err = client_for(&server).get(&["go"]).await.unwrap_err();

    assert!(matches!(err, Error::ResponseValidation { .. }));
    assert_eq!(err.uri(), Some(uri.as_str()));
}

#[tokio::test]
async fn get_rejects_markers_for_another_uri() {
    let mut server = Server::new_async().await;
    let other = format!("{}/api/rust", server.url());
    let _mock = server
        .mock("GET", "/api/go")
        .with_body(framed(&other, "*.test\n"))
        .create_async()
        .await;

    let result = client_for(&server).get(&["go"]).await;

    assert!(matches!(result, Err(Error::ResponseValidation { .. })));
}

#[tokio::test]
async fn get_without_identifiers_fails() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let none: [&str; 0] = [];
    let result = client_for(&server).get(&none).await;

    assert!(matches!(result, Err(Error::ResponseValidation { .. })));
}

#[tokio::test]
async fn get_against_unreachable_host_is_a_transport_error() {
    let client = GitignoreClient::new(ClientConfig::new(TEST_AGENT, "http://127.0.0.1:1")).unwrap();

    let err = client.get(&["java", "go"]).await.unwrap_err();

    assert!(matches!(err, Error::Transport { .. }));
    assert_eq!(err.uri(), Some("http://127.0.0.1:1/api/go,java"));
}

#[tokio::test]
async fn injected_logger_receives_one_error_event_per_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/list")
        .with_body("not a list")
        .create_async()
        .await;
    let capture = CaptureSubscriber::default();
    let client = GitignoreClient::with_logger(
        ClientConfig::new(TEST_AGENT, server.url()),
        Dispatch::new(capture.clone()),
    )
    .unwrap();

    assert!(client.list().await.is_err());

    let events = capture.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, Level::ERROR);
    assert_eq!(
        events[0].fields.get("uri").map(String::as_str),
        Some(format!("{}/api/list", server.url()).as_str())
    );
    assert!(events[0].fields.contains_key("err"));
    assert_eq!(events[0].fields.get("status").map(String::as_str), Some("200"));
}

#[tokio::test]
async fn injected_logger_sees_transport_failures() {
    let capture = CaptureSubscriber::default();
    let client = GitignoreClient::with_logger(
        ClientConfig::new(TEST_AGENT, "http://127.0.0.1:1"),
        Dispatch::new(capture.clone()),
    )
    .unwrap();

    assert!(client.get(&["go"]).await.is_err());

    let events = capture.events();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].fields.get("uri").map(String::as_str),
        Some("http://127.0.0.1:1/api/go")
    );
}

#[tokio::test]
async fn successful_calls_log_nothing() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/list")
        .with_body(LIST_BODY)
        .create_async()
        .await;
    let capture = CaptureSubscriber::default();
    let client = GitignoreClient::with_logger(
        ClientConfig::new(TEST_AGENT, server.url()),
        Dispatch::new(capture.clone()),
    )
    .unwrap();

    client.list().await.unwrap();

    assert!(capture.events().is_empty());
}

#[tokio::test]
async fn mixed_case_host_matches_markers_of_normalized_uri() {
    let mut server = Server::new_async().await;
    let port = server.socket_address().port();
    let uri = format!("http://localhost:{}/api/go", port);
    let _mock = server
        .mock("GET", "/api/go")
        .with_body(framed(&uri, "*.test\n"))
        .create_async()
        .await;
    let client = GitignoreClient::new(ClientConfig::new(
        TEST_AGENT,
        format!("http://LocalHost:{}", port),
    ))
    .unwrap();

    assert_eq!(client.get_path(&["go"]), uri);
    assert!(client.get(&["go"]).await.is_ok());
}

#[tokio::test]
async fn silent_server_times_out_as_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    let client =
        GitignoreClient::new(ClientConfig::new(TEST_AGENT, format!("http://{}", addr))).unwrap();

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(3), client.list())
        .await
        .expect("list() must give up on its own");

    assert!(matches!(result, Err(Error::Transport { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
    accept.abort();
}
