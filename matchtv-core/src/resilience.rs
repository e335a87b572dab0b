//! Resilience patterns for upstream hosts
//!
//! Timeout defaults and the declarative retry policy consumed by the
//! upstream fetcher. Nothing here performs I/O, so policies can be tested
//! on their own.

pub mod timeout {
    //! Timeout configuration for outbound calls

    use std::time::Duration;

    /// Default timeout for a single upstream attempt
    pub const UPSTREAM_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Default timeout for establishing a connection
    pub const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Timeout configuration
    #[derive(Debug, Clone, Copy)]
    pub struct TimeoutConfig {
        pub attempt: Duration,
        pub connect: Duration,
    }

    impl Default for TimeoutConfig {
        fn default() -> Self {
            Self {
                attempt: UPSTREAM_ATTEMPT_TIMEOUT,
                connect: UPSTREAM_CONNECT_TIMEOUT,
            }
        }
    }

    impl TimeoutConfig {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the per-attempt timeout
        #[must_use]
        pub const fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
            self.attempt = timeout;
            self
        }

        /// Set the connect timeout
        #[must_use]
        pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
            self.connect = timeout;
            self
        }
    }

    impl From<&crate::config::UpstreamConfig> for TimeoutConfig {
        fn from(cfg: &crate::config::UpstreamConfig) -> Self {
            Self::new()
                .with_attempt_timeout(cfg.timeout())
                .with_connect_timeout(cfg.connect_timeout())
        }
    }
}

pub mod retry {
    //! Retry policy for upstream fetches
    //!
    //! A policy is a bounded number of attempts, a linear backoff and a
    //! predicate deciding which outcomes are worth another attempt. Only
    //! `403 Forbidden` and transport failures qualify: hosts fronted by
    //! anti-hotlinking layers answer 403 intermittently, while any other
    //! HTTP error is final.
    //!
    //! `backon` only ships constant, exponential and Fibonacci builders, so the
    //! linear schedule is computed here by [`RetryPolicy::delay_before`]. Callers
    //! drive it with the same sleep-then-attempt loop as a `backon` iterator.

    use std::fmt;
    use std::time::Duration;

    /// Result of one upstream attempt
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AttemptOutcome {
        Ok,
        HttpError(u16),
        NetworkError,
    }

    impl AttemptOutcome {
        #[must_use]
        pub const fn is_retryable(&self) -> bool {
            matches!(self, Self::HttpError(403) | Self::NetworkError)
        }
    }

    impl fmt::Display for AttemptOutcome {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Ok => write!(f, "ok"),
                Self::HttpError(status) => write!(f, "http {status}"),
                Self::NetworkError => write!(f, "network error"),
            }
        }
    }

    /// Record of a single attempt, used for logging
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FetchAttempt {
        /// 1-based
        pub number: u32,
        pub delay_before: Duration,
        pub outcome: AttemptOutcome,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RetryPolicy {
        max_attempts: u32,
        backoff_step: Duration,
    }

    impl RetryPolicy {
        /// A single attempt, never retried
        #[must_use]
        pub const fn none() -> Self {
            Self {
                max_attempts: 1,
                backoff_step: Duration::ZERO,
            }
        }

        /// Up to `max_attempts` attempts; attempt `n` waits `(n - 1) * step` first.
        /// A zero `max_attempts` is treated as one.
        #[must_use]
        pub const fn linear(max_attempts: u32, backoff_step: Duration) -> Self {
            Self {
                max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
                backoff_step,
            }
        }

        #[must_use]
        pub const fn max_attempts(&self) -> u32 {
            self.max_attempts
        }

        /// Delay to wait before the given 1-based attempt
        #[must_use]
        pub fn delay_before(&self, attempt: u32) -> Duration {
            self.backoff_step.saturating_mul(attempt.saturating_sub(1))
        }

        /// Whether another attempt should follow `attempt` given its outcome
        #[must_use]
        pub const fn should_retry(&self, attempt: u32, outcome: AttemptOutcome) -> bool {
            attempt < self.max_attempts && outcome.is_retryable()
        }
    }

    impl Default for RetryPolicy {
        fn default() -> Self {
            Self::none()
        }
    }
}
