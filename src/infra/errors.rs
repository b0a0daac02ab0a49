// src/infra/errors.rs — Error types for the reflection agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReflectError {
    // Provider errors (retriable when flagged)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Request failed after {attempts} attempt(s): {last}")]
    RequestExhausted {
        attempts: u32,
        #[source]
        last: Box<ReflectError>,
    },

    // History misconfiguration (never expected under correct seeding)
    #[error("Eviction index {index} out of range for history of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReflectError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ReflectError::Provider {
                retriable: true,
                ..
            } | ReflectError::RateLimited { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_provider() {
        let err = ReflectError::Provider {
            provider: "openai".into(),
            message: "HTTP 502".into(),
            retriable: true,
        };
        assert!(err.is_retriable());
    }

    #[test]
    fn test_rate_limited_is_retriable() {
        let err = ReflectError::RateLimited {
            provider: "openai".into(),
            retry_after_ms: 1000,
        };
        assert!(err.is_retriable());
    }

    #[test]
    fn test_exhausted_not_retriable() {
        let err = ReflectError::RequestExhausted {
            attempts: 6,
            last: Box::new(ReflectError::RateLimited {
                provider: "openai".into(),
                retry_after_ms: 0,
            }),
        };
        assert!(!err.is_retriable());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_exhausted_display_includes_last() {
        let err = ReflectError::RequestExhausted {
            attempts: 6,
            last: Box::new(ReflectError::Provider {
                provider: "local".into(),
                message: "connection refused".into(),
                retriable: true,
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("6 attempt(s)"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_index_out_of_range_display() {
        let err = ReflectError::IndexOutOfRange { index: 3, len: 1 };
        assert_eq!(
            err.to_string(),
            "Eviction index 3 out of range for history of length 1"
        );
    }
}
