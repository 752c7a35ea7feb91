//! CLI argument definitions for the Event Hubs publisher.

use crate::publisher::DEFAULT_SEND_TIMEOUT;
use clap::Args;
use std::fmt;
use std::time::Duration;

/// Event Hubs arguments for the `send` command.
#[derive(Args, Clone)]
pub struct EventHubArgs {
    /// Event Hubs connection string. Takes precedence over the settings file
    /// and $AZURE_EVENTHUB_CONNECTION_STRING
    #[arg(long)]
    pub connection_string: Option<String>,

    /// Event hub to publish to, when the connection string has no EntityPath
    #[arg(long)]
    pub event_hub: Option<String>,

    /// Delivery timeout per message in milliseconds
    #[arg(long, default_value_t = DEFAULT_SEND_TIMEOUT.as_millis() as u64)]
    pub send_timeout_ms: u64,
}

impl Default for EventHubArgs {
    fn default() -> Self {
        Self {
            connection_string: None,
            event_hub: None,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT.as_millis() as u64,
        }
    }
}

impl EventHubArgs {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl fmt::Debug for EventHubArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHubArgs")
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "***"),
            )
            .field("event_hub", &self.event_hub)
            .field("send_timeout_ms", &self.send_timeout_ms)
            .finish()
    }
}
