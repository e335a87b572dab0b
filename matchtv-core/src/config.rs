use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::resilience::retry::RetryPolicy;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub upstream: UpstreamConfig,
    pub relays: RelaysConfig,
    pub sources: SourcesConfig,
    pub tv: TvConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Directory served for every non-API path (the web player).
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 5000,
            static_dir: Some("public".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            max_entries: 16,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Outbound HTTP settings shared by every relay and schedule source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Per-attempt timeout; retry backoff is not counted against it.
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub max_redirects: usize,
    pub max_manifest_bytes: usize,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            connect_timeout_seconds: 10,
            max_redirects: 10,
            max_manifest_bytes: 8 * 1024 * 1024,
            user_agent: crate::spoof::DEFAULT_USER_AGENT.to_string(),
            accept_language: crate::spoof::DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

impl UpstreamConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// One relay instance: which site it impersonates and how hard it retries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub referer: String,
    pub max_attempts: u32,
    pub backoff_step_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            referer: String::new(),
            max_attempts: 1,
            backoff_step_ms: 1000,
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.max_attempts, Duration::from_millis(self.backoff_step_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaysConfig {
    pub football: RelayConfig,
    pub tv: RelayConfig,
}

impl Default for RelaysConfig {
    fn default() -> Self {
        Self {
            football: RelayConfig {
                referer: "https://doofootball.vip/".to_string(),
                max_attempts: 3,
                backoff_step_ms: 1000,
            },
            tv: RelayConfig {
                referer: "https://www.dooballfree24hrs.com/".to_string(),
                max_attempts: 1,
                backoff_step_ms: 1000,
            },
        }
    }
}

/// Schedule pages scraped by the data source adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub football_url: String,
    pub volleyball_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            football_url: "https://doofootball.vip/new-doofootball-vip-2025/".to_string(),
            volleyball_url: "https://pixielive.vip/volleyball-women-world-championship-2025/"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TvConfig {
    pub channels_path: String,
}

impl Default for TvConfig {
    fn default() -> Self {
        Self {
            channels_path: "tv.json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        // Seed with the serialized defaults so a partial section in a file
        // only overrides the keys it names
        let mut builder =
            ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Self::default())?);

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // MATCHTV_SERVER__HTTP_PORT, MATCHTV_RELAYS__FOOTBALL__REFERER, ...
        builder = builder.add_source(
            Environment::with_prefix("MATCHTV")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Hosting platforms hand the listen port over as a bare PORT variable
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.http_port", port)?;
        }

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }

    /// Check the loaded values, collecting every problem instead of stopping at the first
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.http_port == 0 {
            errors.push("server.http_port must be greater than 0".to_string());
        }
        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "warning" | "error"
        ) {
            errors.push(format!("logging.level '{}' is not a valid level", self.logging.level));
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format '{}' must be 'json' or 'pretty'",
                self.logging.format
            ));
        }
        if self.cache.ttl_seconds == 0 {
            errors.push("cache.ttl_seconds must be greater than 0".to_string());
        }
        if self.upstream.timeout_seconds == 0 {
            errors.push("upstream.timeout_seconds must be greater than 0".to_string());
        }
        if self.upstream.max_manifest_bytes == 0 {
            errors.push("upstream.max_manifest_bytes must be greater than 0".to_string());
        }

        for (name, relay) in [("football", &self.relays.football), ("tv", &self.relays.tv)] {
            if relay.max_attempts == 0 {
                errors.push(format!("relays.{name}.max_attempts must be at least 1"));
            }
            if !is_http_url(&relay.referer) {
                errors.push(format!("relays.{name}.referer must be an absolute http(s) URL"));
            }
        }

        for (name, url) in [
            ("football_url", &self.sources.football_url),
            ("volleyball_url", &self.sources.volleyball_url),
        ] {
            if !is_http_url(url) {
                errors.push(format!("sources.{name} must be an absolute http(s) URL"));
            }
        }

        if self.tv.channels_path.trim().is_empty() {
            errors.push("tv.channels_path must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}
