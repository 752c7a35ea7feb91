//! Event Hubs connection string parsing.
//!
//! A connection string looks like
//! `Endpoint=sb://<namespace>.servicebus.windows.net/;SharedAccessKeyName=<name>;SharedAccessKey=<key>;EntityPath=<hub>`.
//! Event Hubs exposes a Kafka endpoint on port 9093 of the same namespace host.

use crate::error::KafkaPublisherError;
use std::fmt;

/// Kafka port of an Event Hubs namespace.
pub const KAFKA_PORT: u16 = 9093;

/// A parsed Event Hubs connection string.
#[derive(Clone)]
pub struct EventHubConnection {
    raw: String,
    namespace_host: String,
    shared_access_key_name: Option<String>,
    entity_path: Option<String>,
}

impl EventHubConnection {
    /// Parse a connection string. Keys are matched case-insensitively and
    /// unknown keys are ignored.
    pub fn parse(connection_string: &str) -> Result<Self, KafkaPublisherError> {
        let raw = connection_string.trim();
        let mut endpoint = None;
        let mut shared_access_key_name = None;
        let mut shared_access_key = None;
        let mut entity_path = None;

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                return Err(KafkaPublisherError::ConnectionString(
                    "every segment must be key=value".to_string(),
                ));
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.to_string()),
                "sharedaccesskeyname" => shared_access_key_name = Some(value.to_string()),
                "sharedaccesskey" => shared_access_key = Some(value.to_string()),
                "entitypath" if !value.is_empty() => entity_path = Some(value.to_string()),
                _ => {}
            }
        }

        let endpoint = endpoint.ok_or_else(|| {
            KafkaPublisherError::ConnectionString("missing Endpoint".to_string())
        })?;
        if !matches!(shared_access_key.as_deref(), Some(key) if !key.is_empty()) {
            return Err(KafkaPublisherError::ConnectionString(
                "missing SharedAccessKey".to_string(),
            ));
        }

        let namespace_host = endpoint
            .split_once("://")
            .map_or(endpoint.as_str(), |(_, rest)| rest)
            .trim_end_matches('/')
            .split(['/', ':'])
            .next()
            .unwrap_or_default()
            .to_string();
        if namespace_host.is_empty() {
            return Err(KafkaPublisherError::ConnectionString(format!(
                "Endpoint '{endpoint}' has no host"
            )));
        }

        Ok(Self {
            raw: raw.to_string(),
            namespace_host,
            shared_access_key_name,
            entity_path,
        })
    }

    /// Kafka bootstrap servers for the namespace.
    pub fn bootstrap_servers(&self) -> String {
        format!("{}:{}", self.namespace_host, KAFKA_PORT)
    }

    pub fn namespace_host(&self) -> &str {
        &self.namespace_host
    }

    pub fn shared_access_key_name(&self) -> Option<&str> {
        self.shared_access_key_name.as_deref()
    }

    /// Event hub named by `EntityPath`, if present.
    pub fn entity_path(&self) -> Option<&str> {
        self.entity_path.as_deref()
    }

    /// The full connection string, used as the SASL password.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Pick the event hub: explicit name first, then `EntityPath`.
    pub fn resolve_event_hub(&self, explicit: Option<&str>) -> Result<String, KafkaPublisherError> {
        explicit
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or(self.entity_path())
            .map(str::to_string)
            .ok_or(KafkaPublisherError::MissingEventHub)
    }
}

/// Replace the value of `SharedAccessKey` with `***`.
pub fn mask_connection_string(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, _)) if key.trim().eq_ignore_ascii_case("SharedAccessKey") => {
                format!("{key}=***")
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

impl fmt::Debug for EventHubConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHubConnection")
            .field("namespace_host", &self.namespace_host)
            .field("shared_access_key_name", &self.shared_access_key_name)
            .field("entity_path", &self.entity_path)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for EventHubConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask_connection_string(&self.raw))
    }
}
