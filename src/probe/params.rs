//! Probe parameter validation.
//!
//! Turns raw, string-typed query values into a [`ProbeRequest`]. The legal
//! ranges here are shared with [`crate::profile::IcmpProfile`] so a target
//! accepted by the registry is always accepted by the prober.

use std::num::IntErrorKind;

use serde::Deserialize;

use super::ProbeError;

/// Default number of echo requests per burst.
pub const DEFAULT_COUNT: u32 = 4;
/// Default spacing between echo requests.
pub const DEFAULT_INTERVAL_MS: u32 = 1000;
/// Default per-probe wait budget.
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;
/// Default ICMP payload size in bytes.
pub const DEFAULT_PACKET_SIZE: u32 = 56;

pub const COUNT_RANGE: (i64, i64) = (1, 500);
pub const INTERVAL_MS_RANGE: (i64, i64) = (10, 1000);
pub const TIMEOUT_MS_RANGE: (i64, i64) = (200, 5000);
pub const PACKET_SIZE_RANGE: (i64, i64) = (0, 1472);

/// Raw query parameters of `GET /probe`.
///
/// Every field stays a string so that malformed values surface as
/// [`ProbeError::InvalidParameter`] instead of a generic extractor rejection.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProbeQuery {
    pub target: Option<String>,
    pub count: Option<String>,
    pub interval_ms: Option<String>,
    pub timeout_ms: Option<String>,
    pub packet_size: Option<String>,
    pub df: Option<String>,
    pub debug: Option<String>,
}

impl ProbeQuery {
    /// Build from decoded key/value pairs in query-string order.
    ///
    /// A repeated key keeps its first value; unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "target" => &mut query.target,
                "count" => &mut query.count,
                "interval_ms" => &mut query.interval_ms,
                "timeout_ms" => &mut query.timeout_ms,
                "packet_size" => &mut query.packet_size,
                "df" => &mut query.df,
                "debug" => &mut query.debug,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        query
    }
}

/// A validated probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// Hostname or literal IP, brackets already stripped.
    pub target: String,
    pub count: u32,
    pub interval_ms: u32,
    pub timeout_ms: u32,
    pub packet_size: u32,
    /// Don't-fragment; only honoured for IPv4 targets.
    pub df: bool,
    /// Echo raw tool output as comment lines.
    pub debug: bool,
}

impl ProbeRequest {
    /// Create a request for `target` with default parameters.
    ///
    /// The target is used as given; use [`ProbeRequest::from_query`] for
    /// untrusted input.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            count: DEFAULT_COUNT,
            interval_ms: DEFAULT_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            packet_size: DEFAULT_PACKET_SIZE,
            df: false,
            debug: false,
        }
    }

    /// Validate raw query values.
    ///
    /// # Errors
    /// Returns [`ProbeError::InvalidParameter`] naming the first offending field.
    pub fn from_query(query: &ProbeQuery) -> Result<Self, ProbeError> {
        let target = normalize_target(query.target.as_deref())?;

        let count = int_in_range(query.count.as_deref(), "count", DEFAULT_COUNT, COUNT_RANGE)?;
        let interval_ms = int_in_range(
            query.interval_ms.as_deref(),
            "interval_ms",
            DEFAULT_INTERVAL_MS,
            INTERVAL_MS_RANGE,
        )?;
        let timeout_ms = int_in_range(
            query.timeout_ms.as_deref(),
            "timeout_ms",
            DEFAULT_TIMEOUT_MS,
            TIMEOUT_MS_RANGE,
        )?;
        let packet_size = int_in_range(
            query.packet_size.as_deref(),
            "packet_size",
            DEFAULT_PACKET_SIZE,
            PACKET_SIZE_RANGE,
        )?;

        let df = optional_bool(query.df.as_deref(), "df")?.unwrap_or(false);
        let debug = optional_bool(query.debug.as_deref(), "debug")?.unwrap_or(false);

        Ok(Self {
            target,
            count,
            interval_ms,
            timeout_ms,
            packet_size,
            df,
            debug,
        })
    }
}

/// Trim the target, reject whitespace and unwrap one `[...]` pair.
pub fn normalize_target(raw: Option<&str>) -> Result<String, ProbeError> {
    let target = raw.map(str::trim).unwrap_or_default();
    if target.is_empty() {
        return Err(ProbeError::invalid("target", "target is required"));
    }
    if target.chars().any(char::is_whitespace) {
        return Err(ProbeError::invalid(
            "target",
            "target must not contain whitespace",
        ));
    }

    let target = target
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(target);
    if target.is_empty() {
        return Err(ProbeError::invalid("target", "target is required"));
    }

    Ok(target.to_string())
}

/// Check `value` against an inclusive `(min, max)` range.
pub fn require_in_range(
    value: i64,
    field: &'static str,
    (min, max): (i64, i64),
) -> Result<(), ProbeError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ProbeError::invalid(
            field,
            format!("{field} must be in range {min}..{max}"),
        ))
    }
}

/// Parse a boolean in any of its common spellings.
pub fn parse_bool(raw: &str, field: &'static str) -> Result<bool, ProbeError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Ok(true),
        "false" | "0" | "no" | "n" | "off" => Ok(false),
        _ => Err(ProbeError::invalid(field, format!("{field} must be a boolean"))),
    }
}

fn int_in_range(
    raw: Option<&str>,
    field: &'static str,
    default: u32,
    range: (i64, i64),
) -> Result<u32, ProbeError> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(default);
    };

    // Digits too long for i64 are still integers, just out of range.
    let value = match raw.trim().parse::<i64>() {
        Ok(value) => value,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => i64::MAX,
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => i64::MIN,
        Err(_) => {
            return Err(ProbeError::invalid(
                field,
                format!("{field} must be an integer"),
            ));
        }
    };
    require_in_range(value, field, range)?;

    // The range check bounds the value to 0..=5000.
    Ok(value as u32)
}

fn optional_bool(raw: Option<&str>, field: &'static str) -> Result<Option<bool>, ProbeError> {
    raw.filter(|s| !s.is_empty())
        .map(|s| parse_bool(s, field))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(target: &str) -> ProbeQuery {
        ProbeQuery {
            target: Some(target.to_string()),
            ..Default::default()
        }
    }

    fn field_of(err: ProbeError) -> &'static str {
        err.field().expect("expected a parameter error")
    }

    #[test]
    fn test_defaults() {
        let req = ProbeRequest::from_query(&query("1.1.1.1")).unwrap();
        assert_eq!(req, ProbeRequest::new("1.1.1.1"));
        assert_eq!(req.count, 4);
        assert_eq!(req.interval_ms, 1000);
        assert_eq!(req.timeout_ms, 1000);
        assert_eq!(req.packet_size, 56);
        assert!(!req.df);
        assert!(!req.debug);
    }

    #[test]
    fn test_target_required() {
        let err = ProbeRequest::from_query(&ProbeQuery::default()).unwrap_err();
        assert_eq!(err.to_string(), "target is required");

        let err = ProbeRequest::from_query(&query("   ")).unwrap_err();
        assert_eq!(field_of(err), "target");
    }

    #[test]
    fn test_target_trimmed_and_whitespace_rejected() {
        let req = ProbeRequest::from_query(&query("  router.lan ")).unwrap();
        assert_eq!(req.target, "router.lan");

        let err = ProbeRequest::from_query(&query("a b")).unwrap_err();
        assert_eq!(err.to_string(), "target must not contain whitespace");
    }

    #[test]
    fn test_target_brackets_stripped() {
        let req = ProbeRequest::from_query(&query("[::1]")).unwrap();
        assert_eq!(req.target, "::1");

        // Only a full enclosing pair is removed.
        let req = ProbeRequest::from_query(&query("[fe80::1")).unwrap();
        assert_eq!(req.target, "[fe80::1");

        assert!(ProbeRequest::from_query(&query("[]")).is_err());
    }

    #[test]
    fn test_bounds_accepted() {
        let cases = [
            ("count", "1"),
            ("count", "500"),
            ("interval_ms", "10"),
            ("interval_ms", "1000"),
            ("timeout_ms", "200"),
            ("timeout_ms", "5000"),
            ("packet_size", "0"),
            ("packet_size", "1472"),
        ];
        for (field, value) in cases {
            let mut q = query("10.0.0.1");
            set_field(&mut q, field, value);
            assert!(
                ProbeRequest::from_query(&q).is_ok(),
                "{field}={value} should be accepted"
            );
        }
    }

    #[test]
    fn test_one_step_outside_bounds_rejected() {
        let cases = [
            ("count", "0", "count must be in range 1..500"),
            ("count", "501", "count must be in range 1..500"),
            ("interval_ms", "9", "interval_ms must be in range 10..1000"),
            ("interval_ms", "1001", "interval_ms must be in range 10..1000"),
            ("timeout_ms", "199", "timeout_ms must be in range 200..5000"),
            ("timeout_ms", "5001", "timeout_ms must be in range 200..5000"),
            ("packet_size", "-1", "packet_size must be in range 0..1472"),
            ("packet_size", "1473", "packet_size must be in range 0..1472"),
        ];
        for (field, value, message) in cases {
            let mut q = query("10.0.0.1");
            set_field(&mut q, field, value);
            let err = ProbeRequest::from_query(&q).unwrap_err();
            assert!(err.is_client_error());
            assert_eq!(err.to_string(), message);
            assert_eq!(field_of(err), field);
        }
    }

    #[test]
    fn test_malformed_integer() {
        let mut q = query("10.0.0.1");
        q.count = Some("four".to_string());
        let err = ProbeRequest::from_query(&q).unwrap_err();
        assert_eq!(err.to_string(), "count must be an integer");
    }

    #[test]
    fn test_oversized_integer_is_range_error() {
        let mut q = query("10.0.0.1");
        q.count = Some("99999999999999999999".to_string());
        let err = ProbeRequest::from_query(&q).unwrap_err();
        assert_eq!(err.to_string(), "count must be in range 1..500");

        q.count = None;
        q.packet_size = Some("-99999999999999999999".to_string());
        let err = ProbeRequest::from_query(&q).unwrap_err();
        assert_eq!(err.to_string(), "packet_size must be in range 0..1472");
    }

    #[test]
    fn test_from_pairs_keeps_first_value() {
        let q = ProbeQuery::from_pairs([
            ("target", "10.0.0.1"),
            ("count", "2"),
            ("count", "3"),
            ("verbose", "1"),
            ("target", "10.0.0.2"),
        ]);
        assert_eq!(q.target.as_deref(), Some("10.0.0.1"));
        assert_eq!(q.count.as_deref(), Some("2"));
        assert!(q.df.is_none());

        let req = ProbeRequest::from_query(&q).unwrap();
        assert_eq!(req.count, 2);
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let q = ProbeQuery {
            target: Some("10.0.0.1".to_string()),
            count: Some(String::new()),
            df: Some(String::new()),
            ..Default::default()
        };
        let req = ProbeRequest::from_query(&q).unwrap();
        assert_eq!(req.count, DEFAULT_COUNT);
        assert!(!req.df);
    }

    #[test]
    fn test_bool_spellings() {
        for raw in ["true", "TRUE", "1", "yes", "y", "on"] {
            assert!(parse_bool(raw, "df").unwrap(), "{raw}");
        }
        for raw in ["false", "0", "No", "n", "off"] {
            assert!(!parse_bool(raw, "df").unwrap(), "{raw}");
        }
        let err = parse_bool("maybe", "debug").unwrap_err();
        assert_eq!(err.to_string(), "debug must be a boolean");
    }

    #[test]
    fn test_df_and_debug_flags() {
        let q = ProbeQuery {
            target: Some("10.0.0.1".to_string()),
            df: Some("on".to_string()),
            debug: Some("1".to_string()),
            ..Default::default()
        };
        let req = ProbeRequest::from_query(&q).unwrap();
        assert!(req.df);
        assert!(req.debug);
    }

    fn set_field(q: &mut ProbeQuery, field: &str, value: &str) {
        let value = Some(value.to_string());
        match field {
            "count" => q.count = value,
            "interval_ms" => q.interval_ms = value,
            "timeout_ms" => q.timeout_ms = value,
            "packet_size" => q.packet_size = value,
            other => panic!("unknown field {other}"),
        }
    }
}
