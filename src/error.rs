use std::time::Duration;
use thiserror::Error;

/// Uniform error type for the federation core.
///
/// Every fallible external call (HTTP, JSON, XML) is converted into one of
/// these variants at its boundary; core logic never sees a raw exception
/// from `reqwest`, `serde_json`, or `roxmltree`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network timeout after {timeout:?} requesting {url}")]
    NetworkTimeout { timeout: Duration, url: String },

    #[error("Connection failed: {url} - {reason}")]
    Connection { url: String, reason: String },

    #[error("HTTP {status}: {body}")]
    Protocol {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Rate limit exceeded for {adapter}: retry after {retry_after:?}")]
    RateLimitExceeded {
        adapter: String,
        retry_after: Duration,
    },

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Empty query")]
    EmptyQuery,

    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Service temporarily unavailable: {service} - {reason}")]
    ServiceUnavailable { service: String, reason: String },

    #[error("Unknown paper id format: {0}")]
    UnknownIdFormat(String),

    #[error("Circuit breaker open for {service}")]
    CircuitOpen { service: String },

    #[error("Operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Service error: {0}")]
    Service(String),
}

/// Error categorization driving retry policy for the optional resilience
/// utilities (circuit breaker / retry-with-backoff). The adapter contract
/// itself prefers partial-success-and-absorb over retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Should not be retried (bad input, permanent upstream rejection).
    Permanent,
    /// Safe to retry with backoff (connection hiccups, 5xx).
    Transient,
    /// Retry after the advertised delay.
    RateLimited,
}

impl Error {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::InvalidInput { .. }
            | Error::EmptyQuery
            | Error::Parse { .. }
            | Error::UnknownIdFormat(_)
            | Error::CircuitOpen { .. }
            | Error::Serde(_) => ErrorCategory::Permanent,

            Error::RateLimitExceeded { .. } => ErrorCategory::RateLimited,

            Error::Http(_)
            | Error::NetworkTimeout { .. }
            | Error::Connection { .. }
            | Error::Timeout { .. }
            | Error::Service(_)
            | Error::ServiceUnavailable { .. } => ErrorCategory::Transient,

            Error::Protocol { status, .. } => match *status {
                429 => ErrorCategory::RateLimited,
                400..=499 => ErrorCategory::Permanent,
                _ => ErrorCategory::Transient,
            },

            Error::SearchFailed(_) => ErrorCategory::Transient,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::RateLimited
        )
    }

    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimitExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
