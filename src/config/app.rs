//! Application configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::validation::{
    ConfigError, check_address, check_bind, check_metrics_path, check_poll_interval,
    normalize_tags, resolve_api_key,
};
use crate::pagination::DEFAULT_PAGE_SIZE;

pub use crate::client::DEFAULT_REQUEST_TIMEOUT;

// =============================================================================
// Constants
// =============================================================================

/// Default exporter port.
pub const DEFAULT_PORT: u16 = 9916;

/// Default metrics endpoint path.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Default Dependency-Track address.
pub const DEFAULT_ADDRESS: &str = "http://localhost:8080";

/// Default poll interval (6 hours).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

/// Split a comma-separated tag list, dropping blank entries.
pub fn parse_tags(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Exporter HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 9916).
    pub port: u16,

    /// Path serving the metrics (default: "/metrics").
    pub metrics_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
        }
    }
}

// =============================================================================
// Dependency-Track Configuration
// =============================================================================

/// Upstream connection and collection settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DependencyTrackConfig {
    /// Base URL of the Dependency-Track API server.
    pub address: String,

    /// API key sent as `X-Api-Key`. Supports `${VAR}` expansion.
    pub api_key: String,

    /// Only export projects carrying one of these tags. Empty exports all.
    pub project_tags: Vec<String>,

    /// Time between collection cycles (default: 6h).
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Items requested per page (default: 500).
    pub page_size: usize,

    /// Timeout for a single upstream request (default: 30s).
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Pre-seed every policy violation series at 0 (default: true).
    pub initialize_violation_metrics: bool,
}

impl Default for DependencyTrackConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            api_key: String::new(),
            project_tags: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            initialize_violation_metrics: true,
        }
    }
}

impl std::fmt::Debug for DependencyTrackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyTrackConfig")
            .field("address", &self.address)
            .field("api_key", &"<redacted>")
            .field("project_tags", &self.project_tags)
            .field("poll_interval", &self.poll_interval)
            .field("page_size", &self.page_size)
            .field("request_timeout", &self.request_timeout)
            .field(
                "initialize_violation_metrics",
                &self.initialize_violation_metrics,
            )
            .finish()
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Exporter HTTP server configuration.
    pub server: ServerConfig,

    /// Dependency-Track configuration.
    pub dtrack: DependencyTrackConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment references in the API key are resolved and tags are
    /// normalised. The result is not validated, so that command-line
    /// overrides can be applied first.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed, or if the
    /// API key references an unset variable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_yaml::from_str(&content)?;
        config.dtrack.api_key = resolve_api_key(&config.dtrack.api_key)?;
        config.dtrack.project_tags = normalize_tags(&config.dtrack.project_tags);
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first rejected setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_bind(&self.server.bind)?;

        if self.server.port == 0 {
            return Err(ConfigError::invalid("server port", "must be non-zero"));
        }

        check_metrics_path(&self.server.metrics_path)?;
        check_address(&self.dtrack.address)?;

        if self.dtrack.api_key.trim().is_empty() {
            return Err(ConfigError::invalid("api_key", "must be set"));
        }

        check_poll_interval(self.dtrack.poll_interval)?;

        if self.dtrack.page_size == 0 {
            return Err(ConfigError::invalid("page_size", "must be positive"));
        }

        Ok(())
    }
}
