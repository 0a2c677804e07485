//! Ping output parsing.
//!
//! Output varies across ping implementations and versions, so statistics are
//! assembled from an ordered list of [`Extractor`]s. Each one looks for a
//! single kind of signal and returns a [`PartialStats`]; the results are
//! merged so that the first extractor to provide a field wins it.
//!
//! Parsing never fails. Text with no recognizable signal yields a burst with
//! zero replies, full loss and no RTT statistics.

use std::sync::LazyLock;

use regex::Regex;

static PACKET_SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^\s*(?P<tx>\d+)\s+packets\s+transmitted,\s+(?P<rx>\d+)\s+(?:packets\s+)?received,.*?(?P<loss>\d+(?:\.\d+)?)%\s+packet\s+loss",
    )
    .expect("packet summary regex")
});

static RTT_SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^\s*(?:rtt|round-trip)\s+min/avg/max/(?:mdev|stddev)\s*=\s*(?P<min>\d+(?:\.\d+)?)/(?P<avg>\d+(?:\.\d+)?)/(?P<max>\d+(?:\.\d+)?)/(?P<stddev>\d+(?:\.\d+)?)\s*ms",
    )
    .expect("rtt summary regex")
});

static REPLY_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\btime[=<]\s*(?P<ms>\d+(?:\.\d+)?)\s*ms\s*$").expect("reply time regex")
});

static REPLY_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*\d+\s+bytes\s+from\s+.+?\s+icmp_seq=\d+").expect("reply line regex")
});

/// Round-trip statistics in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RttStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub stddev: f64,
}

impl RttStats {
    fn from_millis(min: f64, avg: f64, max: f64, stddev: f64) -> Self {
        Self {
            min: min / 1000.0,
            avg: avg / 1000.0,
            max: max / 1000.0,
            stddev: stddev / 1000.0,
        }
    }

    /// Compute statistics from per-reply samples in milliseconds.
    ///
    /// Uses the population standard deviation. Returns `None` for no samples.
    pub fn from_samples_ms(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self::from_millis(min, mean, max, variance.sqrt()))
    }
}

/// Statistics derived from one probe burst.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeStatistics {
    pub packets_sent: u64,
    pub packets_received: u64,
    /// Fraction of packets without a reply, in `[0, 1]`.
    pub packet_loss_ratio: f64,
    /// `None` when no latency could be observed. Never zero-filled.
    pub rtt: Option<RttStats>,
}

impl ProbeStatistics {
    /// At least one reply was observed.
    pub fn success(&self) -> bool {
        self.packets_received > 0
    }
}

/// Fields found by a single extractor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialStats {
    pub packets_sent: Option<u64>,
    pub packets_received: Option<u64>,
    pub packet_loss_ratio: Option<f64>,
    pub rtt: Option<RttStats>,
}

impl PartialStats {
    /// Fill fields still missing here from `other`.
    pub fn merge(&mut self, other: PartialStats) {
        self.packets_sent = self.packets_sent.or(other.packets_sent);
        self.packets_received = self.packets_received.or(other.packets_received);
        self.packet_loss_ratio = self.packet_loss_ratio.or(other.packet_loss_ratio);
        self.rtt = self.rtt.or(other.rtt);
    }

    /// Resolve into final statistics, filling defaults for `expected_count`.
    pub fn finish(self, expected_count: u32) -> ProbeStatistics {
        let packets_received = self.packets_received.unwrap_or(0);
        let packet_loss_ratio = self
            .packet_loss_ratio
            .unwrap_or(if packets_received == 0 { 1.0 } else { 0.0 });

        ProbeStatistics {
            packets_sent: self.packets_sent.unwrap_or(u64::from(expected_count)),
            packets_received,
            packet_loss_ratio,
            rtt: self.rtt,
        }
    }
}

/// A single parsing strategy over raw tool output.
pub trait Extractor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Extract whatever this strategy recognizes. Missing signals are `None`.
    fn extract(&self, output: &str, expected_count: u32) -> PartialStats;
}

/// `4 packets transmitted, 4 received, 0% packet loss`
#[derive(Debug, Clone, Copy)]
pub struct PacketSummary;

impl Extractor for PacketSummary {
    fn name(&self) -> &'static str {
        "packet_summary"
    }

    fn extract(&self, output: &str, _expected_count: u32) -> PartialStats {
        let Some(caps) = PACKET_SUMMARY_RE.captures(output) else {
            return PartialStats::default();
        };
        let (Ok(tx), Ok(rx), Ok(loss)) = (
            caps["tx"].parse::<u64>(),
            caps["rx"].parse::<u64>(),
            caps["loss"].parse::<f64>(),
        ) else {
            return PartialStats::default();
        };

        PartialStats {
            packets_sent: Some(tx),
            packets_received: Some(rx),
            packet_loss_ratio: Some((loss / 100.0).clamp(0.0, 1.0)),
            rtt: None,
        }
    }
}

/// `rtt min/avg/max/mdev = 1.0/2.0/3.0/0.5 ms` and the BSD `round-trip` form.
#[derive(Debug, Clone, Copy)]
pub struct RttSummary;

impl Extractor for RttSummary {
    fn name(&self) -> &'static str {
        "rtt_summary"
    }

    fn extract(&self, output: &str, _expected_count: u32) -> PartialStats {
        let rtt = RTT_SUMMARY_RE.captures(output).and_then(|caps| {
            let field = |name: &str| caps[name].parse::<f64>().ok();
            Some(RttStats::from_millis(
                field("min")?,
                field("avg")?,
                field("max")?,
                field("stddev")?,
            ))
        });

        PartialStats {
            rtt,
            ..Default::default()
        }
    }
}

/// Per-reply `time=12.3 ms` / `time<1 ms` tokens ending their line.
///
/// The end anchor leaves out `(DUP!)` replies and counts a line once.
#[derive(Debug, Clone, Copy)]
pub struct ReplyTimes;

impl ReplyTimes {
    /// Latency samples in milliseconds, in output order.
    pub fn samples_ms(output: &str) -> Vec<f64> {
        REPLY_TIME_RE
            .captures_iter(output)
            .filter_map(|caps| caps["ms"].parse::<f64>().ok())
            .collect()
    }
}

impl Extractor for ReplyTimes {
    fn name(&self) -> &'static str {
        "reply_times"
    }

    fn extract(&self, output: &str, expected_count: u32) -> PartialStats {
        let samples = Self::samples_ms(output);
        if samples.is_empty() {
            return PartialStats::default();
        }

        let received = samples.len() as u64;
        PartialStats {
            packets_sent: None,
            packets_received: Some(received),
            packet_loss_ratio: Some(loss_ratio(received, expected_count)),
            rtt: RttStats::from_samples_ms(&samples),
        }
    }
}

/// `64 bytes from 10.0.0.1: icmp_seq=1 ...` lines without a usable time.
#[derive(Debug, Clone, Copy)]
pub struct ReplyLines;

impl Extractor for ReplyLines {
    fn name(&self) -> &'static str {
        "reply_lines"
    }

    fn extract(&self, output: &str, expected_count: u32) -> PartialStats {
        let received = output
            .lines()
            .filter(|line| REPLY_LINE_RE.is_match(line) && !line.contains("DUP!"))
            .count() as u64;
        PartialStats {
            packets_received: Some(received),
            packet_loss_ratio: Some(loss_ratio(received, expected_count)),
            ..Default::default()
        }
    }
}

/// Extractors in priority order.
pub const EXTRACTORS: [&dyn Extractor; 4] =
    [&PacketSummary, &RttSummary, &ReplyTimes, &ReplyLines];

/// Loss against the requested count; no packets requested counts as total loss.
pub fn loss_ratio(received: u64, sent: u32) -> f64 {
    if sent == 0 {
        return 1.0;
    }
    (1.0 - received as f64 / f64::from(sent)).clamp(0.0, 1.0)
}

/// Derive statistics from raw output of a burst of `expected_count` packets.
pub fn parse_output(output: &str, expected_count: u32) -> ProbeStatistics {
    parse_with(&EXTRACTORS, output, expected_count)
}

/// Run `extractors` in order and merge first-wins per field.
pub fn parse_with(
    extractors: &[&dyn Extractor],
    output: &str,
    expected_count: u32,
) -> ProbeStatistics {
    let mut merged = PartialStats::default();
    for extractor in extractors {
        let partial = extractor.extract(output, expected_count);
        if partial != PartialStats::default() {
            tracing::trace!(extractor = extractor.name(), ?partial, "Extractor matched");
        }
        merged.merge(partial);
    }
    merged.finish(expected_count)
}
