//! Browser-like request headers
//!
//! Upstream stream hosts reject requests that do not look like they come
//! from a desktop browser embedded in the expected site, so every outbound
//! call carries a fixed Chrome-on-Windows profile plus a site `Referer`.

use http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, REFERER,
    USER_AGENT,
};

use crate::config::UpstreamConfig;
use crate::{Error, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "th-TH,th;q=0.9,en-US;q=0.8,en;q=0.7";

const SEC_CH_UA: &str = "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"";

/// Header set impersonating a browser on one site
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    user_agent: String,
    accept_language: String,
    referer: Option<String>,
}

impl BrowserProfile {
    #[must_use]
    pub fn new(user_agent: impl Into<String>, accept_language: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept_language: accept_language.into(),
            referer: None,
        }
    }

    #[must_use]
    pub fn from_config(cfg: &UpstreamConfig) -> Self {
        Self::new(cfg.user_agent.clone(), cfg.accept_language.clone())
    }

    /// Same profile, presenting itself as embedded in `referer`
    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    #[must_use]
    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    /// Render the profile into request headers.
    ///
    /// `Accept-Encoding` is left to the HTTP client so it can decode the
    /// compressed bodies it negotiates.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(14);

        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, header_value(&self.accept_language)?);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("empty"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("cors"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static("cross-site"),
        );
        headers.insert(HeaderName::from_static("sec-ch-ua"), HeaderValue::from_static(SEC_CH_UA));
        headers.insert(
            HeaderName::from_static("sec-ch-ua-mobile"),
            HeaderValue::from_static("?0"),
        );
        headers.insert(
            HeaderName::from_static("sec-ch-ua-platform"),
            HeaderValue::from_static("\"Windows\""),
        );

        if let Some(referer) = &self.referer {
            headers.insert(REFERER, header_value(referer)?);
        }

        Ok(headers)
    }
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT, DEFAULT_ACCEPT_LANGUAGE)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|e| Error::Config(format!("invalid header value '{raw}': {e}")))
}
