//! Configuration module for the exporter.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address, metrics path)
//! - Dependency-Track settings (address, API key, tag filter, polling)
//!
//! Command-line flags and environment variables override file values; see the
//! binary for the flag list.

mod app;
mod validation;

pub use app::{AppConfig, DependencyTrackConfig, ServerConfig, parse_tags};
pub use validation::{
    ConfigError, MIN_POLL_INTERVAL, normalize_tags, parse_poll_interval, resolve_api_key,
};

// Re-export constants
pub use app::{
    DEFAULT_ADDRESS, DEFAULT_METRICS_PATH, DEFAULT_POLL_INTERVAL, DEFAULT_PORT,
    DEFAULT_REQUEST_TIMEOUT,
};
