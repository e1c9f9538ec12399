//! Error types for machine translation providers
//!
//! A `ProviderError` is local to one provider call. The dispatcher recovers
//! from it by falling through to the next provider, so none of these errors
//! ever reach the caller of a document translation.

use std::fmt;
use thiserror::Error;

/// Why a single provider call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Transport failure or non-success HTTP status
    HttpError,
    /// Response body did not have the expected shape
    ParseError,
    /// Provider answered, but the translation was empty or whitespace
    EmptyResult,
    /// The request did not complete within the configured timeout
    Timeout,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderErrorKind::HttpError => "HTTP error",
            ProviderErrorKind::ParseError => "Parse error",
            ProviderErrorKind::EmptyResult => "Empty result",
            ProviderErrorKind::Timeout => "Timeout",
        };
        f.write_str(name)
    }
}

/// Failure of one outbound translation request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// Whether trying again later could plausibly succeed
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    /// Classify a non-success HTTP status.
    ///
    /// Request timeouts, rate limiting and server errors are retryable.
    /// Other client errors (bad key, bad request) will not get better.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let retryable = status.is_server_error()
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::REQUEST_TIMEOUT;
        Self::new(
            ProviderErrorKind::HttpError,
            format!("status {}: {}", status, truncate(body, 200)),
            retryable,
        )
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ParseError, message, true)
    }

    pub fn empty_result() -> Self {
        Self::new(
            ProviderErrorKind::EmptyResult,
            "provider returned an empty translation",
            true,
        )
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    /// Configuration problems (missing key, unusable locale) are never retried
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::HttpError, message, false)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::timeout(err.to_string())
        } else if err.is_decode() {
            ProviderError::parse(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::from_status(status, &err.to_string())
        } else {
            ProviderError::new(ProviderErrorKind::HttpError, err.to_string(), true)
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Result type for provider operations
pub type MtResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert!(ProviderError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "").retryable);
        assert!(ProviderError::from_status(StatusCode::BAD_GATEWAY, "").retryable);
        assert!(ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, "").retryable);
        assert!(ProviderError::from_status(StatusCode::REQUEST_TIMEOUT, "").retryable);
        assert!(!ProviderError::from_status(StatusCode::FORBIDDEN, "").retryable);
        assert!(!ProviderError::from_status(StatusCode::BAD_REQUEST, "").retryable);
    }

    #[test]
    fn test_status_error_kind_and_message() {
        let err = ProviderError::from_status(StatusCode::SERVICE_UNAVAILABLE, "down");
        assert_eq!(err.kind, ProviderErrorKind::HttpError);
        assert!(err.message.contains("503"));
        assert!(err.message.contains("down"));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(1000);
        let err = ProviderError::from_status(StatusCode::BAD_GATEWAY, &body);
        assert!(err.message.chars().count() < 300);
        assert!(err.message.ends_with('…'));
    }

    #[test]
    fn test_empty_result_is_retryable() {
        let err = ProviderError::empty_result();
        assert_eq!(err.kind, ProviderErrorKind::EmptyResult);
        assert!(err.retryable);
    }

    #[test]
    fn test_parse_and_timeout_are_retryable() {
        assert!(ProviderError::parse("missing field").retryable);
        assert!(ProviderError::timeout("15s elapsed").retryable);
        assert!(!ProviderError::config("no key").retryable);
    }

    #[test]
    fn test_display() {
        let err = ProviderError::parse("missing 'translation'");
        assert_eq!(err.to_string(), "Parse error: missing 'translation'");
    }
}
