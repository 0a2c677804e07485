//! ICMP Prober - on-demand ping bursts as Prometheus metrics
//!
//! This crate provides the probe pipeline behind the `icmp-prober` service.
//! It can be used as a library (e.g. by a target registry that shares the
//! probe parameter contract), or run as a standalone HTTP exporter.
//!
//! # Architecture
//!
//! - **Probe**: validate, build the `ping` command, run it, parse, render
//! - **Profile**: ICMP parameter sets and their scrape-interval budgets
//! - **Config**: YAML configuration with CLI/env overrides
//! - **Server**: Axum router for `/probe` and `/healthz`
//!
//! # Example
//!
//! ```rust,no_run
//! use icmp_prober::config::AppConfig;
//! use icmp_prober::server::{AppState, create_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let app = create_router(AppState {
//!         prober: config.probe.prober(),
//!     });
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:9985").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod probe;
pub mod profile;
pub mod server;

pub use config::{AppConfig, ConfigError};
pub use probe::{MetricDocument, ProbeError, ProbeRequest, ProbeStatistics, Prober};
pub use profile::{IcmpProfile, ScrapeProfile};
