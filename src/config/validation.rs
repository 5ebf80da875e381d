//! Checks and normalisation for exporter settings.
//!
//! Each check names the setting it guards, so the error points at the YAML
//! key or flag that needs fixing.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use thiserror::Error;
use url::Url;

/// Minimum poll interval (1 second).
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Paths served by the exporter itself.
const RESERVED_PATHS: &[&str] = &["/", "/healthz"];

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A setting holds an unusable value.
    #[error("invalid {setting}: {reason}")]
    Invalid {
        setting: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(setting: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            setting,
            reason: reason.into(),
        }
    }

    /// Setting rejected by validation, if any.
    pub fn setting(&self) -> Option<&'static str> {
        match self {
            Self::Invalid { setting, .. } => Some(setting),
            _ => None,
        }
    }
}

/// Parse a poll interval such as `6h` or `15m`, enforcing the 1s floor.
///
/// Used as the value parser of `--poll-interval`.
///
/// # Examples
///
/// ```
/// use dtrack_exporter::config::parse_poll_interval;
///
/// assert_eq!(parse_poll_interval("6h").unwrap().as_secs(), 21600);
/// assert_eq!(parse_poll_interval("1h30m").unwrap().as_secs(), 5400);
/// assert!(parse_poll_interval("500ms").is_err());
/// ```
pub fn parse_poll_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("poll interval is empty".to_string());
    }
    let interval = humantime::parse_duration(s).map_err(|e| e.to_string())?;
    check_poll_interval(interval).map_err(|e| e.to_string())?;
    Ok(interval)
}

pub(crate) fn check_poll_interval(interval: Duration) -> Result<(), ConfigError> {
    if interval < MIN_POLL_INTERVAL {
        return Err(ConfigError::invalid(
            "poll_interval",
            format!(
                "{} is below the minimum of {}",
                humantime::format_duration(interval),
                humantime::format_duration(MIN_POLL_INTERVAL)
            ),
        ));
    }
    Ok(())
}

pub(crate) fn check_bind(bind: &str) -> Result<IpAddr, ConfigError> {
    bind.parse()
        .map_err(|_| ConfigError::invalid("server bind address", format!("'{bind}' is not an IP")))
}

/// The metrics path must be an absolute route the exporter does not serve
/// for anything else.
pub(crate) fn check_metrics_path(path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::invalid(
            "metrics_path",
            format!("'{path}' must start with '/'"),
        ));
    }
    if path.contains(['?', '#']) {
        return Err(ConfigError::invalid(
            "metrics_path",
            format!("'{path}' must not carry a query or fragment"),
        ));
    }
    if RESERVED_PATHS.contains(&path) {
        return Err(ConfigError::invalid(
            "metrics_path",
            format!("'{path}' is served by the exporter itself"),
        ));
    }
    Ok(())
}

pub(crate) fn check_address(address: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(address)
        .map_err(|e| ConfigError::invalid("dependency-track address", format!("'{address}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "dependency-track address",
            format!("'{address}' must use http or https"),
        ));
    }
    Ok(url)
}

/// Resolve `${VAR}` and `${VAR:-default}` references in an API key.
///
/// A reference to an unset variable without a default is an error naming
/// the variable, rather than an empty key that upstream rejects with 401.
pub fn resolve_api_key(raw: &str) -> Result<String, ConfigError> {
    static ENV_VAR_REGEX: OnceLock<Regex> = OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    let mut unset = None;
    let resolved = regex
        .replace_all(raw, |caps: &Captures| match std::env::var(&caps[1]) {
            Ok(value) => value,
            Err(_) => match caps.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    unset.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            },
        })
        .trim()
        .to_string();

    match unset {
        Some(var) => Err(ConfigError::invalid(
            "api_key",
            format!("environment variable {var} is not set"),
        )),
        None => Ok(resolved),
    }
}

/// Trim project tags, dropping blanks and repeats while keeping order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_poll_interval() {
        assert_eq!(parse_poll_interval("6h").unwrap(), Duration::from_secs(21600));
        assert_eq!(parse_poll_interval(" 15m ").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_poll_interval("1s").unwrap(), MIN_POLL_INTERVAL);
        assert_eq!(parse_poll_interval("1d").unwrap(), Duration::from_secs(86400));
    }

    #[test]
    fn test_parse_poll_interval_rejects_below_floor() {
        let err = parse_poll_interval("500ms").unwrap_err();
        assert_eq!(
            err,
            "invalid poll_interval: 500ms is below the minimum of 1s"
        );
        assert!(parse_poll_interval("0s").is_err());
    }

    #[test]
    fn test_parse_poll_interval_invalid() {
        assert_eq!(parse_poll_interval("  ").unwrap_err(), "poll interval is empty");
        assert!(parse_poll_interval("6").is_err());
        assert!(parse_poll_interval("six hours").is_err());
    }

    #[test]
    fn test_check_metrics_path() {
        assert!(check_metrics_path("/metrics").is_ok());
        assert!(check_metrics_path("/dtrack/metrics").is_ok());

        for path in ["metrics", "/", "/healthz", "/metrics?x=1", "/metrics#top"] {
            let err = check_metrics_path(path).unwrap_err();
            assert_eq!(err.setting(), Some("metrics_path"), "{path}");
        }
        assert!(
            check_metrics_path("/healthz")
                .unwrap_err()
                .to_string()
                .contains("served by the exporter")
        );
    }

    #[test]
    fn test_check_address() {
        let url = check_address("https://dtrack.example.com/api-proxy").unwrap();
        assert_eq!(url.path(), "/api-proxy");

        for address in ["dtrack.local", "ftp://dtrack.local", ""] {
            let err = check_address(address).unwrap_err();
            assert_eq!(err.setting(), Some("dependency-track address"));
        }
    }

    #[test]
    fn test_check_bind() {
        assert!(check_bind("0.0.0.0").is_ok());
        assert!(check_bind("::1").is_ok());
        assert!(check_bind("localhost").is_err());
    }

    #[test]
    fn test_resolve_api_key_literal() {
        assert_eq!(resolve_api_key(" odt_abc123 ").unwrap(), "odt_abc123");
    }

    #[test]
    fn test_resolve_api_key_default() {
        let key = resolve_api_key("${DEPENDENCY_TRACK_API_KEY_UNSET_7F3A:-odt_fallback}").unwrap();
        assert_eq!(key, "odt_fallback");
    }

    #[test]
    fn test_resolve_api_key_from_env() {
        // SAFETY: the variable name is only used by this test.
        unsafe {
            std::env::set_var("DEPENDENCY_TRACK_API_KEY_FROM_VAULT", "odt_from_vault");
        }
        let key = resolve_api_key("${DEPENDENCY_TRACK_API_KEY_FROM_VAULT}");
        // SAFETY: as above.
        unsafe {
            std::env::remove_var("DEPENDENCY_TRACK_API_KEY_FROM_VAULT");
        }
        assert_eq!(key.unwrap(), "odt_from_vault");
    }

    #[test]
    fn test_resolve_api_key_unset_variable() {
        let err = resolve_api_key("${DEPENDENCY_TRACK_API_KEY_UNSET_9C1D}").unwrap_err();
        assert_eq!(err.setting(), Some("api_key"));
        assert!(
            err.to_string()
                .contains("DEPENDENCY_TRACK_API_KEY_UNSET_9C1D is not set")
        );
    }

    #[test]
    fn test_normalize_tags() {
        assert_eq!(
            normalize_tags(["prod", " eu ", "", "prod", "team a"]),
            ["prod", "eu", "team a"]
        );
        assert!(normalize_tags(Vec::<String>::new()).is_empty());
    }
}
