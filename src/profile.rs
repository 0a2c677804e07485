//! ICMP profiles shared with the target registry.
//!
//! The registry stores an [`IcmpProfile`] per monitored target and passes it
//! to the prober as query parameters, so both sides validate with the same
//! ranges. The registry also refuses profiles whose worst-case burst would
//! not fit the target's [`ScrapeProfile`]; the prober never checks that.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::probe::{
    COUNT_RANGE, DEFAULT_COUNT, DEFAULT_INTERVAL_MS, DEFAULT_PACKET_SIZE, DEFAULT_TIMEOUT_MS,
    INTERVAL_MS_RANGE, PACKET_SIZE_RANGE, ProbeError, TIMEOUT_MS_RANGE, require_in_range,
};

/// Polling cadence a collector uses against a target.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
pub enum ScrapeProfile {
    #[strum(serialize = "1s")]
    #[serde(rename = "1s")]
    OneSecond,
    #[strum(serialize = "5s")]
    #[serde(rename = "5s")]
    FiveSeconds,
    #[default]
    #[strum(serialize = "15s")]
    #[serde(rename = "15s")]
    FifteenSeconds,
    #[strum(serialize = "60s")]
    #[serde(rename = "60s")]
    SixtySeconds,
}

impl ScrapeProfile {
    /// Parse an optional profile; missing or blank means "use the default".
    ///
    /// # Errors
    /// Returns [`ProbeError::InvalidParameter`] for unknown profiles.
    pub fn resolve(raw: Option<&str>) -> Result<Option<Self>, ProbeError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        raw.parse().map(Some).map_err(|_| {
            ProbeError::invalid(
                "scrape_profile",
                "scrape_profile must be one of: 1s, 5s, 15s, 60s",
            )
        })
    }

    /// Longest estimated burst, in milliseconds, allowed under this cadence.
    pub fn max_estimated_ms(self) -> u64 {
        match self {
            Self::OneSecond => 900,
            Self::FiveSeconds => 4500,
            Self::FifteenSeconds | Self::SixtySeconds => 9000,
        }
    }
}

fn default_count() -> u32 {
    DEFAULT_COUNT
}

fn default_interval_ms() -> u32 {
    DEFAULT_INTERVAL_MS
}

fn default_timeout_ms() -> u32 {
    DEFAULT_TIMEOUT_MS
}

fn default_packet_size() -> u32 {
    DEFAULT_PACKET_SIZE
}

/// Probe parameters stored for one ICMP target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcmpProfile {
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
    #[serde(default = "default_packet_size")]
    pub packet_size: u32,
    #[serde(default)]
    pub df: bool,
}

impl Default for IcmpProfile {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            interval_ms: DEFAULT_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            packet_size: DEFAULT_PACKET_SIZE,
            df: false,
        }
    }
}

impl IcmpProfile {
    /// Check every field against the prober's legal ranges.
    pub fn validate(&self) -> Result<(), ProbeError> {
        require_in_range(i64::from(self.count), "count", COUNT_RANGE)?;
        require_in_range(i64::from(self.interval_ms), "interval_ms", INTERVAL_MS_RANGE)?;
        require_in_range(i64::from(self.timeout_ms), "timeout_ms", TIMEOUT_MS_RANGE)?;
        require_in_range(i64::from(self.packet_size), "packet_size", PACKET_SIZE_RANGE)?;
        Ok(())
    }

    /// Worst-case burst length: every gap plus one final timeout.
    pub fn estimated_duration_ms(&self) -> u64 {
        u64::from(self.count.saturating_sub(1)) * u64::from(self.interval_ms)
            + u64::from(self.timeout_ms)
    }

    /// Validate the profile and its fit within `scrape_profile`.
    ///
    /// `None` checks against the default cadence.
    pub fn validate_for(&self, scrape_profile: Option<ScrapeProfile>) -> Result<(), ProbeError> {
        self.validate()?;

        let profile = scrape_profile.unwrap_or_default();
        let estimated = self.estimated_duration_ms();
        let max = profile.max_estimated_ms();
        if estimated > max {
            return Err(ProbeError::invalid(
                "scrape_profile",
                format!(
                    "icmp profile too long for scrape_profile={profile} (estimated {estimated}ms > {max}ms)"
                ),
            ));
        }
        Ok(())
    }
}
