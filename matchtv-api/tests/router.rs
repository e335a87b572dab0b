//! Router tests driven with `oneshot`, no socket involved

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use matchtv_api::{create_router, AppState};
use matchtv_core::cache::ScrapeCache;
use matchtv_core::config::{RelaysConfig, UpstreamConfig};
use matchtv_core::provider::{ScheduleSource, SourceKind};
use matchtv_core::{Error, Result};
use matchtv_proxy::{StreamRelay, FOOTBALL_STREAM_PATH, TV_STREAM_PATH};

/// Adapter returning canned listings, failing while `failures` is non-zero
struct FakeSource {
    kind: SourceKind,
    listings: Vec<Value>,
    calls: AtomicU32,
    failures: AtomicU32,
}

impl FakeSource {
    fn new(kind: SourceKind, listings: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            listings,
            calls: AtomicU32::new(0),
            failures: AtomicU32::new(0),
        })
    }

    fn failing_once(kind: SourceKind, listings: Vec<Value>) -> Arc<Self> {
        let source = Self::new(kind, listings);
        source.failures.store(1, Ordering::SeqCst);
        source
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleSource for FakeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::SourceUnavailable("schedule page timed out".to_string()));
        }
        Ok(self.listings.clone())
    }
}

struct Harness {
    football: Arc<FakeSource>,
    volleyball: Arc<FakeSource>,
    channels_path: PathBuf,
    static_dir: Option<PathBuf>,
}

impl Harness {
    fn new() -> Self {
        Self {
            football: FakeSource::new(
                SourceKind::Football,
                vec![json!({"time": "19:30", "homeTeam": "Arsenal", "awayTeam": "Chelsea"})],
            ),
            volleyball: FakeSource::new(
                SourceKind::Volleyball,
                vec![json!({"match": "Thailand vs Japan", "src": "https://player.example/1"})],
            ),
            channels_path: PathBuf::from("does-not-exist/tv.json"),
            static_dir: None,
        }
    }

    fn router(&self) -> Router {
        let upstream = UpstreamConfig::default();
        let mut relays = RelaysConfig::default();
        relays.football.backoff_step_ms = 10;

        let state = AppState {
            cache: ScrapeCache::new(Duration::from_secs(60), 4),
            football_source: self.football.clone(),
            volleyball_source: self.volleyball.clone(),
            football_relay: Arc::new(
                StreamRelay::from_config(&upstream, &relays.football, FOOTBALL_STREAM_PATH).unwrap(),
            ),
            tv_relay: Arc::new(
                StreamRelay::from_config(&upstream, &relays.tv, TV_STREAM_PATH).unwrap(),
            ),
            channels_path: self.channels_path.clone(),
        };

        create_router(state, self.static_dir.as_deref())
    }
}

async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes.to_vec())
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, bytes) = send(router, Method::GET, uri).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn encode(url: &str) -> String {
    url.replace(':', "%3A").replace('/', "%2F")
}

#[tokio::test]
async fn test_health() {
    let router = Harness::new().router();
    let (status, body) = get_json(&router, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    let stamp = chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).unwrap();
    assert!((chrono::Utc::now() - stamp.with_timezone(&chrono::Utc)).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_football_is_wrapped_and_cached() {
    let harness = Harness::new();
    let router = harness.router();

    let (status, first) = get_json(&router, "/api/football").await;
    let (_, second) = get_json(&router, "/api/football").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["count"], 1);
    assert_eq!(first["data"][0]["homeTeam"], "Arsenal");
    assert_eq!(first, second);
    assert_eq!(harness.football.calls(), 1);
}

#[tokio::test]
async fn test_volleyball_is_a_bare_array() {
    let harness = Harness::new();
    let router = harness.router();

    let (status, body) = get_json(&router, "/api/live/volleyball").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"match": "Thailand vs Japan", "src": "https://player.example/1"}]));
    get_json(&router, "/api/live/volleyball").await;
    assert_eq!(harness.volleyball.calls(), 1);
}

#[tokio::test]
async fn test_source_failure_is_reported_and_not_cached() {
    let mut harness = Harness::new();
    harness.football = FakeSource::failing_once(SourceKind::Football, vec![json!({"time": "21:00"})]);
    let router = harness.router();

    let (status, body) = get_json(&router, "/api/football").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Source unavailable: schedule page timed out");

    let (status, body) = get_json(&router, "/api/football").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(harness.football.calls(), 2);
}

#[tokio::test]
async fn test_tv_channels_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let channels = dir.path().join("tv.json");
    std::fs::write(&channels, r#"[{"name":"Ch 7","url":"https://tv.example/7.m3u8"}]"#).unwrap();

    let mut harness = Harness::new();
    harness.channels_path = channels;
    let (status, body) = get_json(&harness.router(), "/api/tv").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Ch 7");
}

#[tokio::test]
async fn test_tv_channels_missing_file() {
    let (status, body) = get_json(&Harness::new().router(), "/api/tv").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "Unable to load TV channels"}));
}

#[tokio::test]
async fn test_stream_without_url_is_client_error() {
    let router = Harness::new().router();

    for uri in ["/api/football/stream", "/api/tv/stream", "/api/tv/stream?url="] {
        let (status, headers, bytes) = send(&router, Method::GET, uri).await;
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({"success": false, "error": "Missing url parameter"}));
        assert_eq!(headers["access-control-allow-origin"], "*");
    }
}

#[tokio::test]
async fn test_stream_preflight() {
    let router = Harness::new().router();

    for uri in ["/api/football/stream", "/api/tv/stream"] {
        let (status, headers, _) = send(&router, Method::OPTIONS, uri).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-headers"], "*");
    }
}

#[tokio::test]
async fn test_football_stream_rewrites_manifest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a/index.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "#EXTM3U\n#EXT-X-VERSION:3\nseg1.ts\nhttps://other.cdn/seg2.ts\n",
            "application/vnd.apple.mpegurl",
        ))
        .mount(&server)
        .await;

    let router = Harness::new().router();
    let target = format!("{}/a/index.m3u8", server.uri());
    let (status, headers, bytes) = send(
        &router,
        Method::GET,
        &format!("/api/football/stream?url={}", encode(&target)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/vnd.apple.mpegurl");
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        format!(
            "#EXTM3U\n#EXT-X-VERSION:3\n/api/football/stream?url={}\nhttps://other.cdn/seg2.ts\n",
            encode(&format!("{}/a/seg1.ts", server.uri()))
        )
    );
}

#[tokio::test]
async fn test_tv_stream_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let router = Harness::new().router();
    let target = format!("{}/ch/index.m3u8", server.uri());
    let (status, body) = get_json(&router, &format!("/api/tv/stream?url={}", encode(&target))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "HTTP 404: Not Found"}));
}

#[tokio::test]
async fn test_static_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>MatchTV</h1>").unwrap();

    let mut harness = Harness::new();
    harness.static_dir = Some(dir.path().to_path_buf());
    let router = harness.router();

    let (status, _, bytes) = send(&router, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"<h1>MatchTV</h1>");

    let (status, _, _) = send(&router, Method::GET, "/missing.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn test_missing_static_dir_is_ignored() {
    let mut harness = Harness::new();
    harness.static_dir = Some(Path::new("no/such/public").to_path_buf());
    let _router = harness.router();
}
