use thiserror::Error;

/// Errors shared across the relay, the cache and the schedule sources.
///
/// Variants carry rendered messages rather than source errors so the type
/// stays `Clone`; a failed de-duplicated cache refresh hands the same error
/// to every waiting request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("HTTP {status}: {reason}")]
    UpstreamHttp { status: u16, reason: String },

    #[error("Request failed: {0}")]
    UpstreamNetwork(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("{0}")]
    LocalAsset(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an `UpstreamHttp` error from a status code, using its canonical reason
    #[must_use]
    pub fn upstream_status(status: http::StatusCode) -> Self {
        Self::UpstreamHttp {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Request failed").to_string(),
        }
    }

    /// Client-caused failures; everything else is a server-side failure
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::upstream_status(status),
            None => Self::UpstreamNetwork(err.to_string()),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
