//! Configuration parsing helpers and errors.

use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};
use thiserror::Error;

static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("env var regex")
});

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A value parsed but is not usable.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Parse a human-readable duration such as `500ms`, `2s` or `1m30s`.
///
/// Used as a `clap` value parser for duration flags.
///
/// ```
/// use icmp_prober::config::parse_duration;
///
/// assert_eq!(parse_duration("2s").unwrap().as_millis(), 2000);
/// assert_eq!(parse_duration("250ms").unwrap().as_millis(), 250);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(s).map_err(|e| format!("invalid duration '{s}': {e}"))
}

/// Replace `${VAR}` and `${VAR:-default}` with values from the environment.
///
/// Unset variables without a default expand to an empty string.
pub fn expand_env_vars(input: &str) -> String {
    ENV_VAR_RE
        .replace_all(input, |caps: &Captures| {
            let default = caps.get(2).map_or("", |m| m.as_str());
            std::env::var(&caps[1]).unwrap_or_else(|_| default.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_valid() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration(" 500ms ").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
        // Bare numbers carry no unit.
        let err = parse_duration("2").unwrap_err();
        assert!(err.contains("invalid duration '2'"));
    }

    #[test]
    fn test_expand_env_vars_passthrough() {
        assert_eq!(expand_env_vars("ping_path: /bin/ping"), "ping_path: /bin/ping");
    }

    #[test]
    fn test_expand_env_vars_default() {
        let result = expand_env_vars("port: ${PROBER_TEST_UNSET_PORT_4821:-9985}");
        assert_eq!(result, "port: 9985");

        let result = expand_env_vars("bind: ${PROBER_TEST_UNSET_BIND_4821}");
        assert_eq!(result, "bind: ");
    }

    #[test]
    fn test_expand_env_vars_from_env() {
        // SAFETY: test-specific variable, not read by any other test.
        unsafe {
            std::env::set_var("PROBER_TEST_PING_PATH", "/usr/local/bin/ping");
        }
        let result = expand_env_vars("ping_path: ${PROBER_TEST_PING_PATH:-ping}");
        assert_eq!(result, "ping_path: /usr/local/bin/ping");
        // SAFETY: cleanup of the variable set above.
        unsafe {
            std::env::remove_var("PROBER_TEST_PING_PATH");
        }
    }
}
