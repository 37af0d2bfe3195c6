//! Slack webhook channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::messages::{MessageKey, UserMessage};
use crate::NotifyChannel;

/// Environment variable for Slack webhook URL.
const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

/// Used when Slack sends a 429 without `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Posts user messages to a Slack incoming webhook.
pub struct SlackChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a new Slack channel from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let webhook_url = std::env::var(ENV_SLACK_WEBHOOK_URL)
            .ok()
            .filter(|url| !url.is_empty());

        if webhook_url.is_some() {
            debug!("Slack delivery enabled");
        } else {
            debug!("Slack delivery disabled (SLACK_WEBHOOK_URL not set)");
        }

        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    /// Create a Slack channel with a specific webhook URL.
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url: Some(webhook_url),
            client: reqwest::Client::new(),
        }
    }

    fn title(key: MessageKey) -> &'static str {
        match key {
            MessageKey::EditSuccess => "Wikidata edit succeeded",
            MessageKey::EditFailure => "Wikidata edit failed",
        }
    }

    /// Format a message as a Slack webhook payload.
    fn format_payload(message: &UserMessage) -> SlackPayload {
        let attachment = SlackAttachment {
            fallback: message.text.clone(),
            color: message.severity.color().to_string(),
            title: Self::title(message.key).to_string(),
            text: message.text.clone(),
            footer: Some(format!(
                "{} | {}",
                message.severity.as_str(),
                message.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            )),
            ts: Some(message.timestamp.timestamp()),
        };

        SlackPayload {
            attachments: vec![attachment],
        }
    }
}

#[async_trait]
impl NotifyChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, message: &UserMessage) -> Result<(), ChannelError> {
        let webhook_url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured(ENV_SLACK_WEBHOOK_URL.to_string()))?;

        let payload = Self::format_payload(message);

        debug!(channel = "slack", key = message.key.as_str(), "Sending message");

        let response = self.client.post(webhook_url).json(&payload).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(channel = "slack", "Message delivered");
            return Ok(());
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(ChannelError::RateLimited { retry_after_secs });
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            channel = "slack",
            status = %status,
            body = %body,
            "Slack webhook request failed"
        );

        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

// =============================================================================
// Slack API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackPayload {
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    fallback: String,
    color: String,
    title: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ts: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageCatalog;

    #[test]
    fn test_failure_payload_is_red() {
        let message = MessageCatalog::default().message(MessageKey::EditFailure, &[]);
        let payload = SlackChannel::format_payload(&message);

        let attachment = &payload.attachments[0];
        assert_eq!(attachment.color, "#e74c3c");
        assert_eq!(attachment.title, "Wikidata edit failed");
        assert_eq!(attachment.text, message.text);
        assert!(attachment.footer.as_deref().unwrap().starts_with("Critical | "));
    }

    #[test]
    fn test_unconfigured_channel_is_disabled() {
        let channel = SlackChannel {
            webhook_url: None,
            client: reqwest::Client::new(),
        };
        assert!(!channel.enabled());
    }
}
