use std::sync::{Arc, Mutex};
use std::time::Duration;

use kb_engine::{
    FailureKind, FetchSettings, Fetcher, IngestEvent, ProgressSink, ReqwestFetcher, Stage,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<IngestEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<IngestEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: IngestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

const FEED: &str = r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;

#[tokio::test]
async fn fetcher_returns_feed_and_emits_byte_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/all.atom"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(FEED, "application/atom+xml; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let sink = TestSink::default();
    let url = format!("{}/collections/all.atom", server.uri());

    let output = fetcher.fetch(&url, &sink).await.expect("fetch ok");
    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.final_url, output.metadata.original_url);
    assert_eq!(output.metadata.redirect_count, 0);
    assert_eq!(output.metadata.byte_len, FEED.len() as u64);
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("application/atom+xml"));
    assert_eq!(output.bytes, FEED.as_bytes());

    let last_bytes = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            IngestEvent::Progress {
                stage: Stage::Fetch,
                bytes,
                ..
            } => bytes,
            _ => None,
        })
        .last();
    assert_eq!(last_bytes, Some(FEED.len() as u64));
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/missing", server.uri());

    let err = fetcher.fetch(&url, &TestSink::default()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_times_out_when_a_request_timeout_is_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw(FEED, "application/atom+xml"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Some(Duration::from_millis(50)),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/slow", server.uri());

    let err = fetcher.fetch(&url, &TestSink::default()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/xml")
                .insert_header("Content-Length", "11")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/large", server.uri());

    let err = fetcher.fetch(&url, &TestSink::default()).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_html_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/login", server.uri());

    let err = fetcher.fetch(&url, &TestSink::default()).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "text/html".to_string()
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_malformed_url() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let err = fetcher
        .fetch("not a url", &TestSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn fetcher_follows_redirects_and_counts_them() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old.atom"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/all.atom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/all.atom"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FEED, "application/atom+xml"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let output = fetcher
        .fetch(&format!("{}/old.atom", server.uri()), &TestSink::default())
        .await
        .unwrap();

    assert_eq!(output.metadata.redirect_count, 1);
    assert_eq!(output.metadata.final_url, format!("{}/all.atom", server.uri()));
    assert_eq!(output.bytes, FEED.as_bytes());
}

#[tokio::test]
async fn fetcher_gives_up_on_a_redirect_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        redirect_limit: 2,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let err = fetcher
        .fetch(&format!("{}/loop", server.uri()), &TestSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::RedirectLimitExceeded);
}
