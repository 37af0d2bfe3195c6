//! The capability through which edit outcomes reach the user and the logs.

use tracing::{error, info, warn};

use crate::events::{EditEvent, Severity};
use crate::messages::MessageKey;

/// Called once an image claim has been made.
pub trait EditListener: Send + Sync {
    fn on_successful_edit(&self);
}

/// Sink for everything the orchestrator reports.
///
/// `notify_success` and `notify_user_message` are user-visible and are only
/// invoked from the foreground context. `log` may be called from anywhere.
pub trait EditOutcomeNotifier: Send + Sync {
    /// Fire the success listener, if one is registered.
    fn notify_success(&self, listener: Option<&dyn EditListener>) {
        if let Some(listener) = listener {
            listener.on_successful_edit();
        }
    }

    /// Show a localized message to the user.
    fn notify_user_message(&self, key: MessageKey, args: &[String]);

    /// Record a step outcome.
    fn log(&self, event: &EditEvent) {
        let title = event.title();
        match event.severity() {
            Severity::Info => info!(event = ?event, "{title}"),
            Severity::Warning => warn!(event = ?event, "{title}"),
            Severity::Critical => error!(event = ?event, "{title}"),
        }
    }
}
