//! User message delivery channels.

pub mod console;
pub mod slack;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::messages::UserMessage;

/// Trait for places a user message can be shown (terminal, Slack, ...).
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Deliver a message through this channel.
    async fn send(&self, message: &UserMessage) -> Result<(), ChannelError>;
}
