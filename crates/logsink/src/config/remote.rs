//! Remote sink configuration, loaded from a small YAML file.

use std::path::Path;

use figment::providers::{Format, Yaml};
use figment::Figment;
use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_FLUSH_TIMEOUT: u64 = 5;

/// Declarative configuration for the remote sink.
///
/// ```yaml
/// endpoint: https://logs.example.com
/// access_key_id: AK...
/// access_key_secret: ...
/// project: observability
/// route_key: logstore
/// stores:
///   - app-logs
///   - audit
/// ```
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[serde(default)]
pub struct RemoteSinkConfig {
    /// Base URL of the log-store service.
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    /// Tenant project the configured stores belong to.
    pub project: String,
    /// Record field that selects the destination store. Empty disables
    /// routing, which drops every record.
    pub route_key: String,
    /// Store names accepted as routing destinations.
    pub stores: Vec<String>,
    /// Per-request timeout for submissions, in seconds.
    pub flush_timeout: u64,
}

impl Default for RemoteSinkConfig {
    fn default() -> Self {
        RemoteSinkConfig {
            endpoint: String::new(),
            access_key_id: String::new(),
            access_key_secret: String::new(),
            project: String::new(),
            route_key: String::new(),
            stores: Vec::new(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

impl RemoteSinkConfig {
    /// Loads and validates the config file. Endpoint, credentials, project
    /// and at least one store are required; `route_key` is not, since
    /// routing may be deliberately disabled.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let figment = Figment::new().merge(Yaml::file(path));
        let config: RemoteSinkConfig = figment.extract().map_err(|e| {
            ConfigError::Parse(format!("failed to parse remote sink config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::MissingField("endpoint"));
        }
        if self.access_key_id.is_empty() {
            return Err(ConfigError::MissingField("access_key_id"));
        }
        if self.access_key_secret.is_empty() {
            return Err(ConfigError::MissingField("access_key_secret"));
        }
        if self.project.is_empty() {
            return Err(ConfigError::MissingField("project"));
        }
        if self.stores.is_empty() {
            return Err(ConfigError::MissingField("stores"));
        }
        Ok(())
    }
}
