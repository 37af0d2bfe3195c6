//! Terminal channel: writes messages to stderr.

use async_trait::async_trait;
use std::io::Write;

use crate::error::ChannelError;
use crate::messages::UserMessage;
use crate::NotifyChannel;

/// Prints user messages to stderr, one per line.
#[derive(Debug, Default)]
pub struct ConsoleChannel;

#[async_trait]
impl NotifyChannel for ConsoleChannel {
    fn name(&self) -> &'static str {
        "console"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: &UserMessage) -> Result<(), ChannelError> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{}", message.text)?;
        Ok(())
    }
}
