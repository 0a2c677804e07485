//! Configuration module for the prober.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address)
//! - Probe settings (ping binary, supervision grace, debug echo size)

mod app;
mod validation;

pub use app::{AppConfig, ProbeConfig, ServerConfig};
pub use validation::{ConfigError, expand_env_vars, parse_duration};

// Re-export constants
pub use app::{DEFAULT_BIND, DEFAULT_PORT};
