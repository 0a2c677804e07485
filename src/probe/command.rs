//! Ping invocation builder.
//!
//! Maps a [`ProbeRequest`] onto iputils-style `ping` arguments together with
//! the wall-clock deadline the tool is told to honour via `-w`.

use std::fmt;
use std::time::Duration;

use super::ProbeRequest;

/// Default external tool.
pub const DEFAULT_PING_PATH: &str = "ping";

/// IP family selected for the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Pick the family from the target text alone.
    ///
    /// A colon can only appear in a literal IPv6 address; no DNS lookup is
    /// made, so a hostname with only AAAA records is probed as IPv4.
    pub fn for_target(target: &str) -> Self {
        if target.contains(':') { Self::V6 } else { Self::V4 }
    }

    fn flag(self) -> &'static str {
        match self {
            Self::V4 => "-4",
            Self::V6 => "-6",
        }
    }
}

/// A fully built ping invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingCommand {
    pub program: String,
    pub args: Vec<String>,
    pub family: AddressFamily,
    /// Hard ceiling passed to the tool as `-w`.
    pub deadline: Duration,
}

impl PingCommand {
    /// Build the invocation for `request` using the `ping` found on `PATH`.
    pub fn build(request: &ProbeRequest) -> Self {
        Self::build_with(DEFAULT_PING_PATH, request)
    }

    /// Build the invocation for `request` launching `program`.
    pub fn build_with(program: impl Into<String>, request: &ProbeRequest) -> Self {
        let family = AddressFamily::for_target(&request.target);
        let interval_s = interval_seconds(request.interval_ms);
        let timeout_s = timeout_seconds(request.timeout_ms);
        let deadline_s = deadline_seconds(request.count, interval_s, timeout_s);

        let mut args: Vec<String> = vec![
            family.flag().to_string(),
            "-n".to_string(),
            "-c".to_string(),
            request.count.to_string(),
            "-i".to_string(),
            format!("{interval_s:.3}"),
            "-W".to_string(),
            timeout_s.to_string(),
            "-w".to_string(),
            deadline_s.to_string(),
            "-s".to_string(),
            request.packet_size.to_string(),
        ];

        if request.df && family == AddressFamily::V4 {
            args.extend(["-M".to_string(), "do".to_string()]);
        }

        args.push(request.target.clone());

        Self {
            program: program.into(),
            args,
            family,
            deadline: Duration::from_secs(deadline_s),
        }
    }
}

impl fmt::Display for PingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Interval in decimal seconds, never below one millisecond.
pub fn interval_seconds(interval_ms: u32) -> f64 {
    (f64::from(interval_ms) / 1000.0).max(0.001)
}

/// Per-probe timeout in whole seconds, rounded up, at least one.
pub fn timeout_seconds(timeout_ms: u32) -> u64 {
    u64::from(timeout_ms).div_ceil(1000).max(1)
}

/// Worst case for a burst where every packet is lost, plus one second of
/// process slack.
pub fn deadline_seconds(count: u32, interval_s: f64, timeout_s: u64) -> u64 {
    let gaps = f64::from(count.saturating_sub(1));
    let worst = (gaps * interval_s + timeout_s as f64 + 1.0).ceil();
    (worst as u64).max(1)
}
