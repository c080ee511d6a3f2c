//! Crate-wide error hierarchy for hub-client.
//!
//! - Single root `HubError` for all public functions.
//! - Status-aware mapping (401→Unauthorized, 429→RateLimited, 5xx→Server, etc.).
//! - Ergonomic `?` via `From` impls.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type HubResult<T> = Result<T, HubError>;

/// Root error type for the hub-client crate.
#[derive(Debug, Error)]
pub enum HubError {
    /// GitHub API related failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Configuration problems (missing token, bad base URL).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rejected before sending (blank body, zero comment id).
    #[error("validation error: {0}")]
    Validation(String),
}

/// Failure talking to the GitHub API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized: check GITHUB_TOKEN")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited {
        /// `Retry-After` hint in seconds when the API sent one.
        retry_after_secs: Option<u64>,
    },

    /// Server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other non-2xx status not covered above.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected shape of an API response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no GITHUB_TOKEN set in environment")]
    MissingToken,

    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

fn retry_hint(secs: &Option<u64>) -> String {
    secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default()
}

impl ProviderError {
    /// Maps a non-success HTTP status to an error.
    pub fn from_status(code: u16, retry_after_secs: Option<u64>) -> Self {
        match code {
            401 => ProviderError::Unauthorized,
            403 => ProviderError::Forbidden,
            404 => ProviderError::NotFound,
            429 => ProviderError::RateLimited { retry_after_secs },
            500..=599 => ProviderError::Server(code),
            _ => ProviderError::HttpStatus(code),
        }
    }
}

// ===== Conversions for `?` ergonomics =====

impl From<reqwest::Error> for HubError {
    fn from(e: reqwest::Error) -> Self {
        HubError::Provider(ProviderError::from(e))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            return ProviderError::from_status(status.as_u16(), None);
        }
        if e.is_decode() {
            return ProviderError::InvalidResponse(e.to_string());
        }
        ProviderError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(ProviderError::from_status(401, None), ProviderError::Unauthorized));
        assert!(matches!(ProviderError::from_status(403, None), ProviderError::Forbidden));
        assert!(matches!(ProviderError::from_status(404, None), ProviderError::NotFound));
        assert!(matches!(
            ProviderError::from_status(429, Some(30)),
            ProviderError::RateLimited { retry_after_secs: Some(30) }
        ));
        assert!(matches!(ProviderError::from_status(502, None), ProviderError::Server(502)));
        assert!(matches!(ProviderError::from_status(422, None), ProviderError::HttpStatus(422)));
    }

    #[test]
    fn rate_limit_message_mentions_retry_hint() {
        let err = ProviderError::RateLimited { retry_after_secs: Some(12) };
        assert_eq!(err.to_string(), "rate limited (retry after 12s)");
        let err = ProviderError::RateLimited { retry_after_secs: None };
        assert_eq!(err.to_string(), "rate limited");
    }
}
