//! `send` and `validate` command handlers.

pub mod run;

pub use run::{
    build_publisher, build_publisher_with, resolve_concurrency, run_send, run_validate, send_with,
};

use clap::Args;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use telemetry_publish_kafka::EventHubArgs;

/// Default settings file, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.yml";

/// Arguments for the `send` command.
#[derive(Args, Clone, Debug)]
pub struct SendArgs {
    /// Path to the settings YAML file
    #[arg(long, short = 's', default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Maximum messages in flight (overrides concurrencyLimit; default: CPU count)
    #[arg(long, short = 'c')]
    pub concurrency: Option<NonZeroUsize>,

    /// Random seed for deterministic generation (same seed = same messages)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Send one message at a time, waiting `delay` ms between messages
    #[arg(long)]
    pub sequential: bool,

    /// Write messages as JSON lines to this file ("-" for stdout) instead of Event Hubs
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub event_hub: EventHubArgs,
}

impl SendArgs {
    /// Arguments for a run against `settings` with everything else defaulted.
    pub fn for_settings(settings: impl Into<PathBuf>) -> Self {
        Self {
            settings: settings.into(),
            concurrency: None,
            seed: None,
            sequential: false,
            output: None,
            event_hub: EventHubArgs::default(),
        }
    }
}
