//! Publish capability.

use async_trait::async_trait;
use telemetry_core::Message;
use thiserror::Error;

/// Failure of a single publish call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The message was not delivered; other messages may still succeed.
    #[error("publish failed: {0}")]
    Transient(String),

    /// The endpoint cannot accept anything (bad credentials, unreachable).
    #[error("fatal transport error: {0}")]
    Fatal(String),
}

impl PublishError {
    pub fn transient(reason: impl Into<String>) -> Self {
        PublishError::Transient(reason.into())
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        PublishError::Fatal(reason.into())
    }

    /// Whether the dispatcher must stop scheduling new jobs.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PublishError::Fatal(_))
    }
}

/// Destination for generated messages.
///
/// Implementations are shared by every in-flight job of a run and must be
/// safe for concurrent calls. No retry happens above this trait.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver one message.
    async fn publish(&self, message: &Message) -> Result<(), PublishError>;

    /// Flush and release resources once the run has drained.
    async fn close(&self) -> Result<(), PublishError> {
        Ok(())
    }

    /// Short name used in logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(PublishError::fatal("auth").is_fatal());
        assert!(!PublishError::transient("timeout").is_fatal());
        assert_eq!(
            PublishError::fatal("auth").to_string(),
            "fatal transport error: auth"
        );
    }
}
