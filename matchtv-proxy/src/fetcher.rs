//! Upstream fetch with browser headers, a per-attempt timeout and retries
//!
//! The fetcher owns one `reqwest::Client` whose default headers carry the
//! relay's [`BrowserProfile`]. Attempts follow the relay's [`RetryPolicy`].
//! The attempt timeout bounds the response head and the whole playlist read.
//! Streamed segments get the same value as an idle timeout between reads, so
//! a long transfer that keeps moving is never cut off.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RANGE};
use reqwest::StatusCode;
use url::Url;

use matchtv_core::config::{RelayConfig, UpstreamConfig};
use matchtv_core::resilience::retry::{AttemptOutcome, FetchAttempt, RetryPolicy};
use matchtv_core::resilience::timeout::TimeoutConfig;
use matchtv_core::spoof::BrowserProfile;
use matchtv_core::{Error, Result};

/// HTTP client bound to one browser profile and retry policy
#[derive(Clone)]
pub struct UpstreamFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
    timeouts: TimeoutConfig,
}

impl UpstreamFetcher {
    pub fn new(
        profile: &BrowserProfile,
        policy: RetryPolicy,
        timeouts: TimeoutConfig,
        max_redirects: usize,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(profile.headers()?)
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.attempt)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            policy,
            timeouts,
        })
    }

    /// Fetcher for one relay: shared upstream settings plus the relay's referer and retry policy
    pub fn from_config(upstream: &UpstreamConfig, relay: &RelayConfig) -> Result<Self> {
        let profile = BrowserProfile::from_config(upstream).with_referer(relay.referer.clone());
        Self::new(
            &profile,
            relay.retry_policy(),
            TimeoutConfig::from(upstream),
            upstream.max_redirects,
        )
    }

    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// GET `url`, forwarding `range` verbatim when present.
    ///
    /// Returns the first 2xx response. A `403` or a transport failure is
    /// retried while the policy allows it; any other status ends the fetch
    /// with `HTTP <status>: <reason>`.
    pub async fn fetch(&self, url: &Url, range: Option<&HeaderValue>) -> Result<UpstreamResponse> {
        let mut last_err = None;

        for number in 1..=self.policy.max_attempts() {
            let delay_before = self.policy.delay_before(number);
            if delay_before > Duration::ZERO {
                tokio::time::sleep(delay_before).await;
            }

            let (outcome, err) = match self.attempt(url, range).await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(
                        url = %url,
                        attempt = number,
                        status = response.status().as_u16(),
                        "Upstream fetch succeeded"
                    );
                    return Ok(UpstreamResponse::new(response, self.timeouts.attempt));
                }
                Ok(response) => {
                    let status = response.status();
                    (
                        AttemptOutcome::HttpError(status.as_u16()),
                        Error::upstream_status(status),
                    )
                }
                Err(err) => (AttemptOutcome::NetworkError, err),
            };

            let attempt = FetchAttempt {
                number,
                delay_before,
                outcome,
            };

            if !self.policy.should_retry(number, outcome) {
                tracing::warn!(
                    url = %url,
                    attempt = attempt.number,
                    outcome = %attempt.outcome,
                    error = %err,
                    "Upstream fetch failed"
                );
                return Err(err);
            }

            tracing::warn!(
                url = %url,
                attempt = attempt.number,
                delay_ms = attempt.delay_before.as_millis(),
                outcome = %attempt.outcome,
                next_delay_ms = self.policy.delay_before(number + 1).as_millis(),
                "Upstream fetch failed, retrying"
            );
            last_err = Some(err);
        }

        Err(last_err.unwrap_or_else(|| Error::Internal("Retry exhausted".to_string())))
    }

    async fn attempt(&self, url: &Url, range: Option<&HeaderValue>) -> Result<reqwest::Response> {
        let mut request = self.client.get(url.clone());
        if let Some(range) = range {
            request = request.header(RANGE, range.clone());
        }

        match tokio::time::timeout(self.timeouts.attempt, request.send()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(Error::UpstreamNetwork(e.to_string())),
            Err(_) => Err(Error::UpstreamNetwork(format!(
                "timed out after {}s",
                self.timeouts.attempt.as_secs_f32()
            ))),
        }
    }
}

/// A successful upstream response whose body has not been read yet
#[derive(Debug)]
pub struct UpstreamResponse {
    inner: reqwest::Response,
    read_timeout: Duration,
}

impl UpstreamResponse {
    const fn new(inner: reqwest::Response, read_timeout: Duration) -> Self {
        Self {
            inner,
            read_timeout,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// URL the body was served from, after redirects
    #[must_use]
    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Read the whole body as text, failing once it grows past `limit` bytes
    /// or takes longer than the attempt timeout
    pub async fn text_limited(mut self, limit: usize) -> Result<String> {
        let read_timeout = self.read_timeout;
        let read = async move {
            let mut body = BytesMut::new();

            while let Some(chunk) = self
                .inner
                .chunk()
                .await
                .map_err(|e| Error::UpstreamNetwork(format!("failed to read body: {e}")))?
            {
                if body.len() + chunk.len() > limit {
                    return Err(Error::UpstreamNetwork(format!(
                        "manifest exceeds {limit} bytes"
                    )));
                }
                body.extend_from_slice(&chunk);
            }

            Ok(String::from_utf8_lossy(&body).into_owned())
        };

        tokio::time::timeout(read_timeout, read).await.map_err(|_| {
            Error::UpstreamNetwork(format!(
                "timed out reading body after {}s",
                read_timeout.as_secs_f32()
            ))
        })?
    }

    /// Body as a byte stream; dropping the stream aborts the upstream read
    pub fn into_stream(self) -> impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static {
        self.inner.bytes_stream()
    }
}
