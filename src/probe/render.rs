//! Prometheus exposition rendering.

use super::{ProbeStatistics, RawProbeResult};

/// Prefix shared by every metric name.
pub const METRIC_NAMESPACE: &str = "home_noc_icmp";

/// Content type of a rendered document.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Default cap on echoed output lines in debug mode.
pub const DEFAULT_DEBUG_OUTPUT_LINES: usize = 80;

/// A gauge sample value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Int(u64),
    Float(f64),
    /// No observation; rendered as `NaN`, never as zero.
    Absent,
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Float)
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_nan() => f.write_str("NaN"),
            Self::Float(v) if v.is_infinite() => {
                f.write_str(if v.is_sign_positive() { "+Inf" } else { "-Inf" })
            }
            Self::Float(v) => write!(f, "{v:.6}"),
            Self::Absent => f.write_str("NaN"),
        }
    }
}

/// Ordered lines of a metrics response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricDocument {
    lines: Vec<String>,
}

impl MetricDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `# <text>` comment line.
    pub fn comment(&mut self, text: impl AsRef<str>) {
        self.lines.push(format!("# {}\n", text.as_ref()));
    }

    /// Append a HELP/TYPE/value triple for a gauge `<namespace>_<name>`.
    pub fn gauge(&mut self, name: &str, help: &str, value: MetricValue) {
        let full = format!("{METRIC_NAMESPACE}_{name}");
        self.lines.push(format!("# HELP {full} {help}\n"));
        self.lines.push(format!("# TYPE {full} gauge\n"));
        self.lines.push(format!("{full} {value}\n"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Concatenate all lines into a response body.
    pub fn render(&self) -> String {
        self.lines.concat()
    }
}

/// Options that shape the rendered document.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Prepend the tool's exit code and raw output as comments.
    pub debug: bool,
    pub debug_output_lines: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            debug: false,
            debug_output_lines: DEFAULT_DEBUG_OUTPUT_LINES,
        }
    }
}

/// Render statistics and timing of one burst.
pub fn render_metrics(
    stats: &ProbeStatistics,
    raw: &RawProbeResult,
    options: RenderOptions,
) -> MetricDocument {
    let mut doc = MetricDocument::new();

    if options.debug {
        doc.comment(format!("debug ping_exit_code={}", raw.exit_code));
        doc.comment("debug ping_output_begin");
        for line in raw.output.lines().take(options.debug_output_lines) {
            doc.comment(line);
        }
        doc.comment("debug ping_output_end");
    }

    let rtt = stats.rtt;

    doc.gauge(
        "probe_success",
        "1 if at least one reply was received.",
        MetricValue::Int(u64::from(stats.success())),
    );
    doc.gauge(
        "packets_sent",
        "Number of ICMP echo requests sent in the last probe.",
        MetricValue::Int(stats.packets_sent),
    );
    doc.gauge(
        "packets_received",
        "Number of ICMP echo replies received in the last probe.",
        MetricValue::Int(stats.packets_received),
    );
    doc.gauge(
        "packet_loss_ratio",
        "Packet loss ratio (0..1) for the last probe burst.",
        MetricValue::Float(stats.packet_loss_ratio),
    );
    doc.gauge(
        "rtt_min_seconds",
        "Minimum round-trip time (seconds) in the last probe burst.",
        rtt.map(|r| r.min).into(),
    );
    doc.gauge(
        "rtt_avg_seconds",
        "Average round-trip time (seconds) in the last probe burst.",
        rtt.map(|r| r.avg).into(),
    );
    doc.gauge(
        "rtt_max_seconds",
        "Maximum round-trip time (seconds) in the last probe burst.",
        rtt.map(|r| r.max).into(),
    );
    doc.gauge(
        "rtt_stddev_seconds",
        "Round-trip time stddev (seconds) in the last probe burst.",
        rtt.map(|r| r.stddev).into(),
    );
    doc.gauge(
        "probe_duration_seconds",
        "Total time spent running the last probe.",
        MetricValue::Float(raw.duration.as_secs_f64()),
    );

    doc
}
