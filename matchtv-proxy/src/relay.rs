//! Stream relay
//!
//! Turns `?url=<target>` into an upstream fetch and answers with either a
//! rewritten playlist or the upstream bytes, always with permissive CORS and
//! caching disabled.

use axum::body::Body;
use axum::http::header::{
    ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
    EXPIRES, PRAGMA,
};
use axum::http::{response, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

use matchtv_core::config::{RelayConfig, UpstreamConfig};
use matchtv_core::{Error, Result};

use crate::fetcher::{UpstreamFetcher, UpstreamResponse};
use crate::rewrite::ManifestRewriter;

pub const FOOTBALL_STREAM_PATH: &str = "/api/football/stream";
pub const TV_STREAM_PATH: &str = "/api/tv/stream";

pub const MANIFEST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
const DEFAULT_SEGMENT_CONTENT_TYPE: &str = "application/octet-stream";
const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// How an upstream body is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// HLS playlist, buffered and rewritten
    Manifest,
    /// Anything else, streamed through untouched
    Segment,
}

/// A playlist is recognised by an `mpegurl` content type or a `.m3u8` path
/// on either the requested or the final URL.
#[must_use]
pub fn classify_body(content_type: Option<&str>, requested: &Url, fetched: &Url) -> BodyKind {
    let mpegurl = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("mpegurl"));
    let m3u8_path =
        |url: &Url| url.path().to_ascii_lowercase().ends_with(".m3u8");

    if mpegurl || m3u8_path(requested) || m3u8_path(fetched) {
        BodyKind::Manifest
    } else {
        BodyKind::Segment
    }
}

/// Validate the raw `url` query value
pub fn parse_target(raw: Option<&str>) -> Result<Url> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Validation("Missing url parameter".to_string()))?;

    let url = Url::parse(raw)
        .map_err(|e| Error::Validation(format!("Invalid url parameter: {e}")))?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        scheme => Err(Error::Validation(format!(
            "Invalid url parameter: unsupported scheme '{scheme}'"
        ))),
    }
}

/// One relay endpoint: a fetcher impersonating a site, mounted at `proxy_path`
#[derive(Clone)]
pub struct StreamRelay {
    fetcher: UpstreamFetcher,
    proxy_path: String,
    max_manifest_bytes: usize,
}

impl StreamRelay {
    #[must_use]
    pub fn new(fetcher: UpstreamFetcher, proxy_path: impl Into<String>, max_manifest_bytes: usize) -> Self {
        Self {
            fetcher,
            proxy_path: proxy_path.into(),
            max_manifest_bytes,
        }
    }

    pub fn from_config(
        upstream: &UpstreamConfig,
        relay: &RelayConfig,
        proxy_path: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(
            UpstreamFetcher::from_config(upstream, relay)?,
            proxy_path,
            upstream.max_manifest_bytes,
        ))
    }

    #[must_use]
    pub fn proxy_path(&self) -> &str {
        &self.proxy_path
    }

    #[must_use]
    pub const fn fetcher(&self) -> &UpstreamFetcher {
        &self.fetcher
    }

    /// Relay `target`, forwarding the client's `Range` header if any.
    ///
    /// Validation happens before any network call.
    pub async fn relay(&self, target: Option<&str>, range: Option<&HeaderValue>) -> Result<Response> {
        let url = parse_target(target)?;
        let upstream = self.fetcher.fetch(&url, range).await?;

        match classify_body(upstream.content_type(), &url, upstream.url()) {
            BodyKind::Manifest => self.manifest_response(upstream).await,
            BodyKind::Segment => segment_response(upstream),
        }
    }

    async fn manifest_response(&self, upstream: UpstreamResponse) -> Result<Response> {
        let base = upstream.url().clone();
        let playlist = upstream.text_limited(self.max_manifest_bytes).await?;
        let rewritten = ManifestRewriter::new(&base, &self.proxy_path).rewrite(&playlist);

        tracing::debug!(
            base = %base,
            original_bytes = playlist.len(),
            rewritten_bytes = rewritten.len(),
            "Rewrote manifest"
        );

        stream_headers(Response::builder().status(StatusCode::OK))
            .header(CONTENT_TYPE, MANIFEST_CONTENT_TYPE)
            .body(Body::from(rewritten))
            .map_err(|e| Error::Internal(format!("Failed to build manifest response: {e}")))
    }
}

fn segment_response(upstream: UpstreamResponse) -> Result<Response> {
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_SEGMENT_CONTENT_TYPE));

    let mut builder = stream_headers(Response::builder().status(upstream.status()))
        .header(CONTENT_TYPE, content_type)
        .header(ACCEPT_RANGES, "bytes");

    for name in [CONTENT_RANGE, CONTENT_LENGTH] {
        if let Some(value) = upstream.headers().get(&name) {
            builder = builder.header(name, value.clone());
        }
    }

    builder
        .body(Body::from_stream(upstream.into_stream()))
        .map_err(|e| Error::Internal(format!("Failed to build segment response: {e}")))
}

fn stream_headers(builder: response::Builder) -> response::Builder {
    builder
        .header(CACHE_CONTROL, NO_CACHE)
        .header(PRAGMA, "no-cache")
        .header(EXPIRES, "0")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(ACCESS_CONTROL_ALLOW_HEADERS, "*")
}

/// Preflight handler suitable for `OPTIONS` routes.
#[allow(clippy::unused_async)]
pub async fn proxy_options_preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "*"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "*"),
        ],
    )
}
