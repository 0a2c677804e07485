//! Application configuration structures.

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::probe::{
    DEFAULT_DEADLINE_GRACE, DEFAULT_DEBUG_OUTPUT_LINES, DEFAULT_PING_PATH, Prober, SystemRunner,
};

use super::validation::{ConfigError, expand_env_vars};

// =============================================================================
// Constants
// =============================================================================

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9985;

fn default_ping_path() -> String {
    DEFAULT_PING_PATH.to_string()
}

fn default_deadline_grace() -> Duration {
    DEFAULT_DEADLINE_GRACE
}

fn default_debug_output_lines() -> usize {
    DEFAULT_DEBUG_OUTPUT_LINES
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 9985).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

// =============================================================================
// Probe Configuration
// =============================================================================

/// Probe execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// External ping tool (default: "ping" from `PATH`).
    #[serde(default = "default_ping_path")]
    pub ping_path: String,

    /// Extra time past the tool's own deadline before it is killed (default: 2s).
    #[serde(default = "default_deadline_grace", with = "humantime_serde")]
    pub deadline_grace: Duration,

    /// Raw output lines echoed in debug mode (default: 80).
    #[serde(default = "default_debug_output_lines")]
    pub debug_output_lines: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_path: default_ping_path(),
            deadline_grace: DEFAULT_DEADLINE_GRACE,
            debug_output_lines: DEFAULT_DEBUG_OUTPUT_LINES,
        }
    }
}

impl ProbeConfig {
    /// Build a prober that launches real processes with these settings.
    pub fn prober(&self) -> Prober {
        Prober::new(Arc::new(SystemRunner::new(self.deadline_grace)))
            .with_ping_path(&self.ping_path)
            .with_debug_output_lines(self.debug_output_lines)
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Probe configuration.
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&expand_env_vars(&content))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server bind address
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        // Validate server port
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        if self.probe.ping_path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "probe ping_path cannot be empty".to_string(),
            ));
        }

        if self.probe.debug_output_lines == 0 {
            return Err(ConfigError::ValidationError(
                "probe debug_output_lines must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
