//! Error types for the JSONL publisher.

use thiserror::Error;

/// Errors that can occur while opening the JSONL output.
#[derive(Error, Debug)]
pub enum JsonlPublisherError {
    #[error("Failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
