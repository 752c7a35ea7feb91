//! Connection string resolution.
//!
//! Credentials come from an explicit, ordered chain of sources. The first
//! source holding a non-blank value wins:
//!
//! 1. an explicit override (the `--connection-string` CLI flag), if configured
//! 2. `azureEventHub.connectionString` from the settings file
//! 3. the `AZURE_EVENTHUB_CONNECTION_STRING` environment variable
//!
//! When every source is blank, resolution fails with
//! [`CredentialsError::Missing`] before any task is scheduled.

use crate::error::CredentialsError;
use crate::settings::Settings;
use std::fmt;

/// Environment variable consulted after the settings file.
pub const CONNECTION_STRING_ENV: &str = "AZURE_EVENTHUB_CONNECTION_STRING";

/// One link of the credential chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Value passed explicitly by the caller
    Explicit(Option<String>),
    /// Value read from the settings file
    Settings(Option<String>),
    /// Environment variable name
    Environment(String),
}

/// Where a resolved credential came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOrigin {
    Explicit,
    Settings,
    Environment(String),
}

impl fmt::Display for CredentialOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialOrigin::Explicit => write!(f, "command line"),
            CredentialOrigin::Settings => write!(f, "settings file"),
            CredentialOrigin::Environment(var) => write!(f, "environment variable {var}"),
        }
    }
}

/// A resolved connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub connection_string: String,
    pub origin: CredentialOrigin,
}

// Keep the secret out of debug output.
impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("connection_string", &"***")
            .field("origin", &self.origin)
            .finish()
    }
}

/// Ordered list of credential sources.
#[derive(Debug, Clone, Default)]
pub struct CredentialChain {
    sources: Vec<CredentialSource>,
}

impl CredentialChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard chain for a settings document: settings value, then environment.
    pub fn for_settings(settings: &Settings) -> Self {
        Self::new()
            .with_settings(settings.connection_string().map(str::to_string))
            .with_environment(CONNECTION_STRING_ENV)
    }

    /// Put an explicit override in front of the existing sources.
    pub fn with_override(mut self, value: Option<String>) -> Self {
        self.sources.insert(0, CredentialSource::Explicit(value));
        self
    }

    pub fn with_settings(mut self, value: Option<String>) -> Self {
        self.sources.push(CredentialSource::Settings(value));
        self
    }

    pub fn with_environment(mut self, var: impl Into<String>) -> Self {
        self.sources.push(CredentialSource::Environment(var.into()));
        self
    }

    pub fn sources(&self) -> &[CredentialSource] {
        &self.sources
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ResolvedCredential, CredentialsError> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Resolve with a custom environment lookup.
    pub fn resolve_with<F>(&self, lookup_env: F) -> Result<ResolvedCredential, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for source in &self.sources {
            let (value, origin) = match source {
                CredentialSource::Explicit(value) => (value.clone(), CredentialOrigin::Explicit),
                CredentialSource::Settings(value) => (value.clone(), CredentialOrigin::Settings),
                CredentialSource::Environment(var) => {
                    (lookup_env(var), CredentialOrigin::Environment(var.clone()))
                }
            };

            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                return Ok(ResolvedCredential {
                    connection_string: value.trim().to_string(),
                    origin,
                });
            }
        }

        Err(CredentialsError::Missing {
            tried: self.describe(),
        })
    }

    fn describe(&self) -> String {
        if self.sources.is_empty() {
            return "no sources".to_string();
        }
        self.sources
            .iter()
            .map(|source| match source {
                CredentialSource::Explicit(_) => "command line".to_string(),
                CredentialSource::Settings(_) => "settings file".to_string(),
                CredentialSource::Environment(var) => format!("${var}"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
