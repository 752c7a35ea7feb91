//! Send and validate command runners.

use anyhow::Context;
use std::sync::Arc;
use telemetry_core::{CredentialChain, Settings, SimulationConfig};
use telemetry_dispatch::{BoundedDispatcher, DispatchReport, LogProgress, Publisher};
use telemetry_generator::{MessageBuilder, TaskPlan};
use telemetry_publish_jsonl::JsonlPublisher;
use telemetry_publish_kafka::{EventHubConnection, EventHubPublisher};

use super::SendArgs;

/// Load the settings file and validate it.
fn load_settings(args: &SendArgs) -> anyhow::Result<(Settings, SimulationConfig)> {
    let settings = Settings::from_file(&args.settings)
        .with_context(|| format!("Failed to load settings from {:?}", args.settings))?;
    let config = settings
        .validate()
        .with_context(|| format!("Invalid settings in {:?}", args.settings))?;
    Ok((settings, config))
}

/// Concurrency for a run: `--concurrency`, then `concurrencyLimit`, then the
/// CPU count.
pub fn resolve_concurrency(args: &SendArgs, config: &SimulationConfig) -> usize {
    args.concurrency
        .map(|n| n.get())
        .unwrap_or_else(|| config.effective_concurrency(num_cpus::get()))
}

/// Open the destination selected by `args`.
///
/// `--output` selects the JSONL sink and needs no credentials. Otherwise the
/// connection string is resolved from the command line, the settings file,
/// then `$AZURE_EVENTHUB_CONNECTION_STRING`.
pub fn build_publisher(args: &SendArgs, settings: &Settings) -> anyhow::Result<Arc<dyn Publisher>> {
    build_publisher_with(args, settings, |var| std::env::var(var).ok())
}

/// [`build_publisher`] with the environment read through `lookup_env`.
pub fn build_publisher_with<F>(
    args: &SendArgs,
    settings: &Settings,
    lookup_env: F,
) -> anyhow::Result<Arc<dyn Publisher>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(output) = &args.output {
        let publisher = JsonlPublisher::create(output)
            .with_context(|| format!("Failed to open output {output:?}"))?;
        return Ok(Arc::new(publisher));
    }

    let credential = CredentialChain::for_settings(settings)
        .with_override(args.event_hub.connection_string.clone())
        .resolve_with(lookup_env)?;
    let connection = EventHubConnection::parse(&credential.connection_string)?;
    tracing::info!(
        "Using connection string from {}: {}",
        credential.origin,
        connection
    );

    let explicit_hub = args
        .event_hub
        .event_hub
        .as_deref()
        .or(settings.event_hub_name());
    let event_hub = connection.resolve_event_hub(explicit_hub)?;

    let publisher = EventHubPublisher::new(&connection, event_hub, args.event_hub.send_timeout())
        .context("Failed to create Event Hubs producer")?;
    Ok(Arc::new(publisher))
}

/// Run the `send` command: generate every planned message and publish it.
///
/// Returns the run report. A fatal publish error is returned as an error
/// after the summary has been logged.
pub async fn run_send(args: SendArgs) -> anyhow::Result<DispatchReport> {
    let (settings, config) = load_settings(&args)?;
    let publisher = build_publisher(&args, &settings)?;
    send_with(&args, &config, publisher).await
}

/// Dispatch the plan of `config` to `publisher`, then close it.
///
/// A failed close is an error: buffered messages may never have reached the
/// destination.
pub async fn send_with(
    args: &SendArgs,
    config: &SimulationConfig,
    publisher: Arc<dyn Publisher>,
) -> anyhow::Result<DispatchReport> {
    let concurrency = resolve_concurrency(args, config);

    tracing::info!(
        "Simulating {} entities x {} messages (start id {}, seed={:?})",
        config.entity_count,
        config.max_messages,
        config.start_id,
        args.seed
    );

    let dispatcher = BoundedDispatcher::new(
        publisher.clone(),
        MessageBuilder::from_config(config),
        concurrency,
    )
    .with_seed(args.seed);

    let token = dispatcher.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, waiting for in-flight messages");
            token.cancel();
        }
    });

    let plan = TaskPlan::from_config(config);
    let progress = LogProgress::default();
    let result = if args.sequential {
        dispatcher
            .run_sequential(plan, config.delay, &progress)
            .await
    } else {
        dispatcher.run(plan, &progress).await
    };
    interrupt.abort();

    let closed = publisher.close().await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            e.report().log_summary();
            if let Err(close_err) = closed {
                tracing::warn!("Failed to close {}: {}", publisher.name(), close_err);
            }
            return Err(e).context("Send failed");
        }
    };
    report.log_summary();

    closed.with_context(|| format!("Failed to close {}", publisher.name()))?;
    Ok(report)
}

/// Run the `validate` command: parse and validate the settings file.
pub fn run_validate(args: &SendArgs) -> anyhow::Result<SimulationConfig> {
    let (_, config) = load_settings(args)?;

    let value_names: Vec<&str> = config.values.iter().map(|v| v.name.as_str()).collect();
    tracing::info!(
        "Settings OK: {} messages ({} entities x {}), id key '{}', timestamp {}, geo {:?}, values {:?}",
        config.total_tasks(),
        config.entity_count,
        config.max_messages,
        config.id_key_name,
        if config.timestamp_enabled { "on" } else { "off" },
        config.geo,
        value_names
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::num::NonZeroUsize;
    use telemetry_core::CredentialsError;

    fn write_settings(dir: &tempfile::TempDir, yaml: &str) -> std::path::PathBuf {
        let path = dir.path().join("settings.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        path
    }

    const SETTINGS: &str = "\
entityCount: 2
maxMessages: 3
concurrencyLimit: 3
values:
  - name: temperature
    min: 10
    max: 30
";

    #[test]
    fn test_resolve_concurrency_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = SendArgs::for_settings(write_settings(&dir, SETTINGS));
        let (_, config) = load_settings(&args).unwrap();

        assert_eq!(resolve_concurrency(&args, &config), 3);

        args.concurrency = NonZeroUsize::new(7);
        assert_eq!(resolve_concurrency(&args, &config), 7);

        let unset = SimulationConfig::default();
        args.concurrency = None;
        assert_eq!(resolve_concurrency(&args, &unset), num_cpus::get().max(1));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            &dir,
            "entityCount: 1\nmaxMessages: 1\nvalues:\n  - {name: t, min: 5, max: 1}\n",
        );
        let err = run_validate(&SendArgs::for_settings(path)).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid settings"));
    }

    #[test]
    fn test_validate_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_validate(&SendArgs::for_settings(dir.path().join("nope.yml"))).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load settings"));
    }

    #[test]
    fn test_event_hub_without_credentials_fails_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let args = SendArgs::for_settings(write_settings(&dir, SETTINGS));
        let (settings, _) = load_settings(&args).unwrap();

        let Err(err) = build_publisher_with(&args, &settings, |_| None) else {
            panic!("expected missing credentials to fail");
        };
        assert!(matches!(
            err.downcast_ref::<CredentialsError>(),
            Some(CredentialsError::Missing { .. })
        ));
        assert!(err.to_string().contains("AZURE_EVENTHUB_CONNECTION_STRING"));
    }

    #[test]
    fn test_event_hub_rejects_malformed_connection_string() {
        let dir = tempfile::tempdir().unwrap();
        let args = SendArgs::for_settings(write_settings(&dir, SETTINGS));
        let (settings, _) = load_settings(&args).unwrap();

        let result = build_publisher_with(&args, &settings, |_| Some("not-a-connection".into()));
        assert!(result.is_err());
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
        }
    }

    #[tokio::test]
    async fn test_failed_close_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let args = SendArgs::for_settings(write_settings(&dir, SETTINGS));
        let (_, config) = load_settings(&args).unwrap();
        let publisher = Arc::new(JsonlPublisher::from_writer(Box::new(BrokenWriter), "full disk"));

        let err = send_with(&args, &config, publisher).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to close full disk"));
    }

    #[tokio::test]
    async fn test_clean_close_returns_report() {
        let dir = tempfile::tempdir().unwrap();
        let args = SendArgs::for_settings(write_settings(&dir, SETTINGS));
        let (_, config) = load_settings(&args).unwrap();
        let publisher = Arc::new(JsonlPublisher::from_writer(Box::new(std::io::sink()), "sink"));

        let report = send_with(&args, &config, publisher).await.unwrap();
        assert_eq!(report.succeeded, 6);
    }

    #[test]
    fn test_output_selects_jsonl_publisher() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = SendArgs::for_settings(write_settings(&dir, SETTINGS));
        args.output = Some(dir.path().join("out.jsonl"));
        let (settings, _) = load_settings(&args).unwrap();

        let publisher = build_publisher(&args, &settings).unwrap();
        assert!(publisher.name().starts_with("JSONL file"));
    }
}
