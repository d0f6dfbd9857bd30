//! Error types for the Campbell Cloud client.
//!
//! # Design
//! HTTP status codes are never errors here: every response, 4xx and 5xx
//! included, is folded into a `NormalizedResult` by the normalizer. The
//! variants below cover the few conditions the client itself rejects, plus
//! transport failures for callers that ask for them via `request_raw`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The token exchange answered without an `access_token`.
    #[error("Invalid credentials. Please check username and password.")]
    InvalidCredentials,

    /// A caller-supplied value was rejected before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A path placeholder had no value, or an empty one.
    #[error("endpoint `{endpoint}` requires path argument `{name}`")]
    MissingPathArgument { endpoint: &'static str, name: String },

    /// No HTTP response was obtained.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A request body value could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Serialization(e.to_string())
    }
}
