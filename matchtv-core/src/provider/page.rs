//! Schedule page download
//!
//! Plain GET with the browser profile; any failure is reported as the
//! source being unavailable.

use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::spoof::BrowserProfile;
use crate::{Error, Result};

#[derive(Clone)]
pub struct PageClient {
    client: reqwest::Client,
}

impl PageClient {
    pub fn new(profile: BrowserProfile, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(profile.headers()?)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn from_config(cfg: &UpstreamConfig) -> Result<Self> {
        Self::new(BrowserProfile::from_config(cfg), cfg.timeout())
    }

    /// Download `url` and return its body as text
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SourceUnavailable(format!(
                "{url}: HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Request failed")
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("{url}: failed to read body: {e}")))
    }
}

/// Parse a CSS selector, reporting a malformed one as an internal error
pub(crate) fn selector(css: &str) -> Result<scraper::Selector> {
    scraper::Selector::parse(css).map_err(|e| Error::Internal(format!("bad selector '{css}': {e:?}")))
}

/// Text content with runs of whitespace collapsed, like a rendered `innerText`
pub(crate) fn collapsed_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
