//! Line-per-message JSON writer.

use crate::error::JsonlPublisherError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use telemetry_core::Message;
use telemetry_dispatch::{PublishError, Publisher};
use tracing::{debug, info};

/// Default buffer size for JSONL writing.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Output path that selects stdout.
pub const STDOUT_PATH: &str = "-";

/// Writes every published message as one JSON line.
///
/// Lines from concurrent jobs never interleave; their order follows
/// completion order, not task order.
pub struct JsonlPublisher {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    lines_written: AtomicU64,
    name: String,
}

impl JsonlPublisher {
    /// Open `path` for writing, truncating it. `-` writes to stdout.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, JsonlPublisherError> {
        let path = path.as_ref();
        if path.as_os_str() == STDOUT_PATH {
            return Ok(Self::stdout());
        }

        let file = File::create(path).map_err(|source| JsonlPublisherError::Open {
            path: path.display().to_string(),
            source,
        })?;
        info!("Writing messages to '{}'", path.display());

        Ok(Self::from_writer(
            Box::new(file),
            format!("JSONL file '{}'", path.display()),
        ))
    }

    pub fn stdout() -> Self {
        Self::from_writer(Box::new(std::io::stdout()), "stdout")
    }

    /// Wrap any writer. `name` shows up in logs.
    pub fn from_writer(writer: Box<dyn Write + Send>, name: impl Into<String>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, writer)),
            lines_written: AtomicU64::new(0),
            name: name.into(),
        }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    fn write_line(&self, message: &Message) -> std::io::Result<()> {
        let mut line = message.to_json_vec()?;
        line.push(b'\n');
        self.writer.lock().write_all(&line)
    }
}

#[async_trait]
impl Publisher for JsonlPublisher {
    async fn publish(&self, message: &Message) -> Result<(), PublishError> {
        // A broken output will reject every later line too.
        self.write_line(message)
            .map_err(|e| PublishError::fatal(format!("failed to write to {}: {e}", self.name)))?;
        self.lines_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| PublishError::fatal(format!("failed to flush {}: {e}", self.name)))?;
        debug!("Flushed {} line(s) to {}", self.lines_written(), self.name);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
