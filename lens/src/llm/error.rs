//! Provider transport errors

use std::time::Duration;

use thiserror::Error;

/// Failure talking to a model provider
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP 429; the advertised wait is reported, never slept on
    #[error("Provider is rate limiting requests (retry after {}s)", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Provider returned HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Could not reach provider: {0}")]
    Network(#[from] reqwest::Error),

    /// Bad configuration, or a prompt that could not be built
    #[error("Request not sent: {0}")]
    InvalidRequest(String),

    #[error("Unreadable provider reply: {0}")]
    InvalidResponse(String),
}

/// HTTP statuses worth another attempt
pub(crate) fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504 | 529)
}

impl LlmError {
    /// A failure the transport may retry; rate limits are not among them
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Network(e) => e.is_timeout() || e.is_connect(),
            LlmError::ApiError { status, .. } => is_transient_status(*status),
            LlmError::RateLimited { .. } | LlmError::InvalidRequest(_) | LlmError::InvalidResponse(_) => false,
        }
    }

    /// HTTP status behind the failure, when the provider answered
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::RateLimited { .. } => Some(429),
            LlmError::ApiError { status, .. } => Some(*status),
            LlmError::Network(e) => e.status().map(|s| s.as_u16()),
            LlmError::InvalidRequest(_) | LlmError::InvalidResponse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> LlmError {
        LlmError::ApiError {
            status,
            message: "upstream".to_string(),
        }
    }

    #[test]
    fn test_transient_statuses() {
        assert!(api(503).is_transient());
        assert!(api(529).is_transient());
        assert!(!api(400).is_transient());
        assert!(!api(401).is_transient());
    }

    #[test]
    fn test_rate_limit_not_retried() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(20),
        };
        assert!(!err.is_transient());
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.to_string(), "Provider is rate limiting requests (retry after 20s)");
    }

    #[test]
    fn test_local_failures_have_no_status() {
        let err = LlmError::InvalidRequest("missing template".to_string());
        assert!(!err.is_transient());
        assert_eq!(err.status(), None);
        assert!(LlmError::InvalidResponse("bad JSON".to_string()).status().is_none());
    }
}
