//! Error types for settings and credential handling.

use thiserror::Error;

/// Errors raised while loading or validating settings.
///
/// All of these are fatal and are reported before any task is scheduled.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Error reading the settings file
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing YAML (includes missing required fields)
    #[error("Failed to parse settings YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A field is present but unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A value breaks an invariant the generator relies on
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Errors raised while resolving the ingestion credential.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// Every source in the chain was empty
    #[error("No connection string provided (tried: {tried})")]
    Missing { tried: String },
}
