//! Command-line interface for iot-telemetry-sim
//!
//! # Usage Examples
//!
//! ```bash
//! # Send using the connection string from settings.yml or
//! # $AZURE_EVENTHUB_CONNECTION_STRING
//! iot-telemetry-sim send --settings settings.yml
//!
//! # Override concurrency and the event hub
//! iot-telemetry-sim send --concurrency 16 --event-hub telemetry
//!
//! # Legacy paced mode: one message at a time, `delay` ms apart
//! iot-telemetry-sim send --sequential
//!
//! # Reproducible capture to a file
//! iot-telemetry-sim send --seed 42 --output telemetry.jsonl
//! ```

use clap::{Parser, Subcommand};
use iot_telemetry_sim::{run_send, run_validate, SendArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iot-telemetry-sim")]
#[command(about = "Generate synthetic IoT telemetry and publish it to Azure Event Hubs")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate messages and publish them
    Send {
        #[command(flatten)]
        args: SendArgs,
    },

    /// Parse and validate a settings file without sending anything
    Validate {
        /// Path to the settings YAML file
        #[arg(long, short = 's', default_value = iot_telemetry_sim::DEFAULT_SETTINGS_FILE)]
        settings: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send { args } => {
            run_send(args).await?;
        }
        Commands::Validate { settings } => {
            run_validate(&SendArgs::for_settings(settings))?;
        }
    }

    Ok(())
}
