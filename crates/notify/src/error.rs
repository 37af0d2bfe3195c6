//! Error types for message delivery.

use thiserror::Error;

/// Errors a channel can hit while delivering a user message.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Webhook request could not be sent.
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel has no destination configured.
    #[error("channel not configured: {0}")]
    NotConfigured(String),

    /// The webhook refused the payload.
    #[error("webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The webhook asked us to slow down.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Writing to a local stream failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}
