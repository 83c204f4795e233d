//! Error types shared by every component of the polling pipeline.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why an operator-supplied city list was rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Cities can't be empty.")]
    Empty,

    #[error("Cities must be a comma separated list of letter-only names, got '{0}'.")]
    BadFormat(String),
}

/// Failure to exchange credentials for a bearer token.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("authentication endpoint returned status {0}")]
    Status(StatusCode),

    #[error("authentication succeeded but the token was empty or missing")]
    EmptyToken,

    #[error("authentication response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("authentication request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl AuthFailure {
    /// Connection-level failures count against the transport retry budget.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("{operation}: request failed after retries: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation}: still unauthorized after {attempts} attempts")]
    Unauthorized { operation: &'static str, attempts: u32 },

    #[error("{operation}: request failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{operation}: failed to decode response body: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("the weather API did not return any supported cities")]
    NoSupportedCities,

    #[error("failed to persist observations: {0}")]
    Persistence(#[source] std::io::Error),
}

impl Error {
    /// Errors that must stop the run instead of being skipped per item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Validation(_) | Self::Auth(_) | Self::NoSupportedCities
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_readable() {
        assert_eq!(ValidationError::Empty.to_string(), "Cities can't be empty.");
        let err = ValidationError::BadFormat("Vilnius1".into());
        assert!(err.to_string().contains("Vilnius1"));
    }

    #[test]
    fn fatal_classification() {
        assert!(Error::NoSupportedCities.is_fatal());
        assert!(Error::from(AuthFailure::EmptyToken).is_fatal());
        assert!(Error::from(ValidationError::Empty).is_fatal());

        let unauthorized = Error::Unauthorized { operation: "fetch_weather", attempts: 4 };
        assert!(!unauthorized.is_fatal());
        assert!(!Error::Persistence(std::io::Error::other("disk full")).is_fatal());
    }

    #[test]
    fn unauthorized_mentions_operation() {
        let err = Error::Unauthorized { operation: "list_supported_cities", attempts: 4 };
        let msg = err.to_string();
        assert!(msg.contains("list_supported_cities"));
        assert!(msg.contains('4'));
    }
}
