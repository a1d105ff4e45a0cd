//! Error types for Marketa
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Marketa operations
///
/// Covers configuration loading, record store and auth calls, and every
/// failure mode of an assistant turn. Callers that need to branch on a
/// specific failure downcast the `anyhow::Error` they receive.
#[derive(Error, Debug)]
pub enum MarketaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected client-side before anything was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record store errors (insert, read, list)
    #[error("Store error: {0}")]
    Store(String),

    /// Authentication errors returned by the auth provider
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The operation needs a signed-in session
    #[error("Not signed in: {0}")]
    NotAuthenticated(String),

    /// The polling attempt budget was exhausted without a response
    #[error("{message}")]
    Timeout {
        /// Number of attempts that were made
        attempts: u32,
        /// User-facing message
        message: String,
    },

    /// The generation endpoint answered 429
    #[error("Rate limits exceeded, please try again later.")]
    RateLimited,

    /// The generation endpoint answered 402
    #[error("Payment required, please add credits.")]
    PaymentRequired,

    /// Any other non-success answer from the generation endpoint
    #[error("Assistant endpoint returned {status}: {body}")]
    Endpoint {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The response stream ended without usable content
    #[error("Stream error: {0}")]
    Stream(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Marketa operations
///
/// Uses `anyhow::Error` so errors carry context as they propagate.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = MarketaError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_validation_error_display() {
        let error = MarketaError::Validation("email is required".to_string());
        assert_eq!(error.to_string(), "Validation error: email is required");
    }

    #[test]
    fn test_timeout_error_shows_message_only() {
        let error = MarketaError::Timeout {
            attempts: 60,
            message: "Response timeout.".to_string(),
        };
        assert_eq!(error.to_string(), "Response timeout.");
    }

    #[test]
    fn test_rate_limited_display() {
        assert_eq!(
            MarketaError::RateLimited.to_string(),
            "Rate limits exceeded, please try again later."
        );
    }

    #[test]
    fn test_payment_required_display() {
        assert_eq!(
            MarketaError::PaymentRequired.to_string(),
            "Payment required, please add credits."
        );
    }

    #[test]
    fn test_endpoint_error_display() {
        let error = MarketaError::Endpoint {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "Assistant endpoint returned 500: boom");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: MarketaError = io_error.into();
        assert!(matches!(error, MarketaError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: MarketaError = json_error.into();
        assert!(matches!(error, MarketaError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: MarketaError = yaml_error.into();
        assert!(matches!(error, MarketaError::Yaml(_)));
    }

    #[test]
    fn test_downcast_from_anyhow() {
        let err: anyhow::Error = MarketaError::PaymentRequired.into();
        assert!(matches!(
            err.downcast_ref::<MarketaError>(),
            Some(MarketaError::PaymentRequired)
        ));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MarketaError>();
    }
}
