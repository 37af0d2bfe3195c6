//! Error types for the entity gateway.

use thiserror::Error;

/// Errors that can occur while talking to the knowledge base.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The API answered with an error object.
    #[error("API error: {code} - {info}")]
    Api { code: String, info: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A field the response must carry was absent.
    #[error("Response is missing `{0}`")]
    MissingField(&'static str),

    /// An entity id could not be used for the requested write.
    #[error("Invalid entity id: {0}")]
    InvalidEntity(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
