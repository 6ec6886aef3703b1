//! Translation provider errors
//!
//! `Provider` failures are transient from the client's point of view and are
//! retried per batch; the other variants fail immediately.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Transport, auth, quota or response-shape failure in a backend
    #[error("{provider} error: {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Failure description
        message: String,
    },

    /// No provider registered under the requested name
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A real backend is missing required configuration (usually an API key)
    #[error("{provider} is not configured: {reason}")]
    NotConfigured {
        /// Provider name
        provider: String,
        /// What is missing
        reason: String,
    },
}

impl TranslationError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        TranslationError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the client should retry the failed batch
    pub fn is_retryable(&self) -> bool {
        matches!(self, TranslationError::Provider { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_is_retryable() {
        let err = TranslationError::provider("DeepL", "429 Too Many Requests");
        assert_eq!(err.to_string(), "DeepL error: 429 Too Many Requests");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unsupported_provider_is_not_retryable() {
        let err = TranslationError::UnsupportedProvider("babelfish".to_string());
        assert_eq!(err.to_string(), "Unsupported provider: babelfish");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_not_configured_is_not_retryable() {
        let err = TranslationError::NotConfigured {
            provider: "deepl".to_string(),
            reason: "DEEPL_API_KEY is not set".to_string(),
        };
        assert!(!err.is_retryable());
    }
}
