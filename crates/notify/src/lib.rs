//! Edit outcome notifications.
//!
//! This crate is how annotation results leave the orchestrator: localized
//! user messages delivered fire-and-forget, an optional success listener,
//! and structured [`EditEvent`] log records.
//!
//! # Usage
//!
//! ```no_run
//! use notify::{EditOutcomeNotifier, MessageKey, Notifier};
//!
//! # #[tokio::main]
//! # async fn main() {
//! // Create notifier from environment variables
//! let notifier = Notifier::from_env();
//!
//! // Show a message (fire-and-forget)
//! notifier.notify_user_message(MessageKey::EditSuccess, &["Tour Eiffel".to_string()]);
//! # }
//! ```
//!
//! # Configuration
//!
//! - `SLACK_WEBHOOK_URL`: Slack webhook URL (enables the Slack channel)
//! - `NOTIFY_CONSOLE`: Set to "false" to stop printing messages to stderr
//! - `NOTIFY_LOCALE`: Message language (`en`, `fr`, `de`; default `en`)
//! - `NOTIFY_DISABLED`: Set to "true" to drop all user messages
//!
//! # Architecture
//!
//! - [`EditOutcomeNotifier`] is the capability the orchestrator is given
//! - [`NotifyChannel`] trait defines where a message can be shown
//! - [`Notifier`] renders messages and dispatches them to every enabled channel

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;
pub mod messages;
pub mod outcome;

pub use channels::console::ConsoleChannel;
pub use channels::slack::SlackChannel;
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use events::{EditEvent, Severity};
pub use messages::{MessageCatalog, MessageKey, UserMessage};
pub use outcome::{EditListener, EditOutcomeNotifier};

use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Environment variable to disable all user messages.
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";

/// Environment variable to turn the stderr channel off.
const ENV_NOTIFY_CONSOLE: &str = "NOTIFY_CONSOLE";

/// Environment variable selecting the message language.
const ENV_NOTIFY_LOCALE: &str = "NOTIFY_LOCALE";

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

/// Central message dispatcher.
///
/// Renders user messages in the configured language and delivers them to
/// every enabled channel in a fire-and-forget manner.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    catalog: MessageCatalog,
    disabled: bool,
    deliveries: TaskTracker,
}

impl Notifier {
    /// Create a new notifier from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let catalog = std::env::var(ENV_NOTIFY_LOCALE)
            .map(|locale| MessageCatalog::new(&locale))
            .unwrap_or_default();

        if env_flag(ENV_NOTIFY_DISABLED).unwrap_or(false) {
            info!("User messages disabled via NOTIFY_DISABLED");
            return Self {
                channels: vec![],
                catalog,
                disabled: true,
                deliveries: TaskTracker::new(),
            };
        }

        let mut channels: Vec<Arc<dyn NotifyChannel>> = vec![];

        if env_flag(ENV_NOTIFY_CONSOLE).unwrap_or(true) {
            channels.push(Arc::new(ConsoleChannel));
        }

        let slack = SlackChannel::from_env();
        if slack.enabled() {
            info!("Slack delivery enabled");
            channels.push(Arc::new(slack));
        }

        if channels.is_empty() {
            warn!("No message channels configured");
        } else {
            info!(
                channel_count = channels.len(),
                language = catalog.language(),
                "Notifier initialized"
            );
        }

        Self {
            channels,
            catalog,
            disabled: false,
            deliveries: TaskTracker::new(),
        }
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            catalog: MessageCatalog::default(),
            disabled: false,
            deliveries: TaskTracker::new(),
        }
    }

    /// Create a disabled notifier (for testing or when messages are off).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            channels: vec![],
            catalog: MessageCatalog::default(),
            disabled: true,
            deliveries: TaskTracker::new(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    /// Check if any channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Deliver a message to all enabled channels (fire-and-forget).
    ///
    /// Spawns one task per channel and returns immediately. Errors are
    /// logged but not propagated to the caller; use [`Notifier::flush`] to
    /// wait for outstanding deliveries.
    pub fn dispatch(&self, message: UserMessage) {
        if !self.has_channels() {
            debug!(key = message.key.as_str(), "No channels, dropping message");
            return;
        }

        let message = Arc::new(message);

        for channel in &self.channels {
            let channel = Arc::clone(channel);
            let message = Arc::clone(&message);

            self.deliveries.spawn(async move {
                let channel_name = channel.name();

                if !channel.enabled() {
                    debug!(channel = channel_name, "Channel disabled, skipping");
                    return;
                }

                match channel.send(&message).await {
                    Ok(()) => {
                        debug!(channel = channel_name, "Message delivered");
                    }
                    Err(e) => {
                        error!(
                            channel = channel_name,
                            error = %e,
                            "Failed to deliver message"
                        );
                    }
                }
            });
        }
    }

    /// Wait until every message dispatched so far has been delivered or failed.
    pub async fn flush(&self) {
        self.deliveries.close();
        self.deliveries.wait().await;
        self.deliveries.reopen();
    }

    /// Deliver a message and wait for all channels to complete.
    ///
    /// Unlike [`Notifier::dispatch`], this waits for every channel and
    /// collects the results.
    pub async fn dispatch_and_wait(
        &self,
        message: UserMessage,
    ) -> Vec<(String, Result<(), ChannelError>)> {
        if !self.has_channels() {
            return vec![];
        }

        let mut results = vec![];

        for channel in &self.channels {
            let channel_name = channel.name().to_string();
            let result = channel.send(&message).await;
            results.push((channel_name, result));
        }

        results
    }
}

impl EditOutcomeNotifier for Notifier {
    fn notify_user_message(&self, key: MessageKey, args: &[String]) {
        self.dispatch(self.catalog.message(key, args));
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener(AtomicUsize);

    struct UnconfiguredChannel;

    #[async_trait::async_trait]
    impl NotifyChannel for UnconfiguredChannel {
        fn name(&self) -> &'static str {
            "unconfigured"
        }

        fn enabled(&self) -> bool {
            false
        }

        async fn send(&self, _message: &UserMessage) -> Result<(), ChannelError> {
            Err(ChannelError::NotConfigured("test".to_string()))
        }
    }

    impl EditListener for CountingListener {
        fn on_successful_edit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_disabled_notifier() {
        let notifier = Notifier::disabled();
        assert!(!notifier.has_channels());
        assert_eq!(notifier.channel_count(), 0);
    }

    #[test]
    fn test_notify_success_fires_listener_once() {
        let listener = CountingListener(AtomicUsize::new(0));
        let notifier = Notifier::disabled();

        notifier.notify_success(Some(&listener));
        notifier.notify_success(None);

        assert_eq!(listener.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_severity_colors() {
        assert_eq!(Severity::Info.color(), "#3498db");
        assert_eq!(Severity::Warning.color(), "#f39c12");
        assert_eq!(Severity::Critical.color(), "#e74c3c");
    }

    #[test]
    fn test_event_titles_and_severity() {
        let entity_id = wikibase::EntityId::parse("Q1").unwrap();

        let event = EditEvent::ClaimRejected {
            entity_id: entity_id.clone(),
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(event.title(), "Image claim rejected for Q1");
        assert_eq!(event.severity(), Severity::Critical);

        let event = EditEvent::LabelFailed {
            file_entity_id: wikibase::EntityId::media_info(9),
            language: wikibase::LanguageCode::new("fr"),
            error: "timeout".to_string(),
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(event.title(), "Label [fr] on M9 failed: timeout");
        assert_eq!(event.severity(), Severity::Warning);
    }

    #[tokio::test]
    async fn test_flush_waits_for_dispatched_messages() {
        let notifier = Notifier::with_channels(vec![Arc::new(ConsoleChannel)]);
        notifier.notify_user_message(MessageKey::EditFailure, &[]);
        notifier.flush().await;
        assert!(notifier.deliveries.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_and_wait_reports_per_channel() {
        let notifier = Notifier::with_channels(vec![
            Arc::new(ConsoleChannel),
            Arc::new(UnconfiguredChannel),
        ]);
        let message = notifier.catalog().message(MessageKey::EditFailure, &[]);

        let results = notifier.dispatch_and_wait(message).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "console");
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(ChannelError::NotConfigured(_))));
    }
}
