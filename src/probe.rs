//! ICMP probe pipeline.
//!
//! One request flows through five stages with no state shared between
//! requests:
//!
//! - [`ProbeRequest::from_query`]: validate raw query values
//! - [`PingCommand::build_with`]: build the ping invocation and its deadline
//! - [`ProcessRunner::run`]: execute it and capture output
//! - [`parse_output`]: derive [`ProbeStatistics`] from the text
//! - [`render_metrics`]: serialize them as a [`MetricDocument`]
//!
//! [`Prober`] wires the stages together around an injectable runner.
//!
//! # Example
//!
//! ```rust,no_run
//! use icmp_prober::probe::{ProbeRequest, Prober};
//!
//! # async fn run() -> Result<(), icmp_prober::probe::ProbeError> {
//! let prober = Prober::system();
//! let doc = prober.probe(&ProbeRequest::new("192.168.1.1")).await?;
//! print!("{}", doc.render());
//! # Ok(())
//! # }
//! ```

mod command;
mod error;
mod params;
mod parser;
mod render;
mod runner;

use std::sync::Arc;

pub use command::{AddressFamily, DEFAULT_PING_PATH, PingCommand};
pub use error::ProbeError;
pub use params::{
    COUNT_RANGE, DEFAULT_COUNT, DEFAULT_INTERVAL_MS, DEFAULT_PACKET_SIZE, DEFAULT_TIMEOUT_MS,
    INTERVAL_MS_RANGE, PACKET_SIZE_RANGE, ProbeQuery, ProbeRequest, TIMEOUT_MS_RANGE,
    normalize_target, parse_bool, require_in_range,
};
pub use parser::{
    EXTRACTORS, Extractor, PacketSummary, PartialStats, ProbeStatistics, ReplyLines, ReplyTimes,
    RttStats, RttSummary, parse_output, parse_with,
};
pub use render::{
    CONTENT_TYPE, DEFAULT_DEBUG_OUTPUT_LINES, METRIC_NAMESPACE, MetricDocument, MetricValue,
    RenderOptions, render_metrics,
};
pub use runner::{
    DEFAULT_DEADLINE_GRACE, KILLED_EXIT_CODE, ProcessRunner, RawProbeResult, SystemRunner,
};

/// Runs probe requests end to end.
#[derive(Clone)]
pub struct Prober {
    runner: Arc<dyn ProcessRunner>,
    ping_path: String,
    debug_output_lines: usize,
}

impl Prober {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            ping_path: DEFAULT_PING_PATH.to_string(),
            debug_output_lines: DEFAULT_DEBUG_OUTPUT_LINES,
        }
    }

    /// Prober launching real `ping` processes.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner::default()))
    }

    /// Set the external tool to launch.
    pub fn with_ping_path(mut self, path: impl Into<String>) -> Self {
        self.ping_path = path.into();
        self
    }

    /// Set how many raw output lines debug mode echoes.
    pub fn with_debug_output_lines(mut self, lines: usize) -> Self {
        self.debug_output_lines = lines;
        self
    }

    /// Run one burst and render its metrics.
    ///
    /// # Errors
    /// Returns [`ProbeError::ToolLaunch`] if the tool cannot be started.
    /// Loss and unreachable targets are reported through the metrics.
    pub async fn probe(&self, request: &ProbeRequest) -> Result<MetricDocument, ProbeError> {
        let command = PingCommand::build_with(&self.ping_path, request);
        tracing::debug!(target_host = %request.target, command = %command, "Running ping");

        let raw = self.runner.run(&command).await?;
        let stats = parse_output(&raw.output, request.count);

        tracing::debug!(
            target_host = %request.target,
            exit_code = raw.exit_code,
            duration_ms = raw.duration.as_millis(),
            packets_sent = stats.packets_sent,
            packets_received = stats.packets_received,
            loss = stats.packet_loss_ratio,
            "Ping probe finished"
        );

        Ok(render_metrics(
            &stats,
            &raw,
            RenderOptions {
                debug: request.debug,
                debug_output_lines: self.debug_output_lines,
            },
        ))
    }
}

impl std::fmt::Debug for Prober {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prober")
            .field("ping_path", &self.ping_path)
            .field("debug_output_lines", &self.debug_output_lines)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Replays canned output and records the commands it was given.
    struct FakeRunner {
        output: String,
        exit_code: i32,
        seen: Mutex<Vec<PingCommand>>,
    }

    impl FakeRunner {
        fn new(exit_code: i32, output: &str) -> Arc<Self> {
            Arc::new(Self {
                output: output.to_string(),
                exit_code,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ProcessRunner for FakeRunner {
        async fn run(&self, command: &PingCommand) -> Result<RawProbeResult, ProbeError> {
            self.seen.lock().unwrap().push(command.clone());
            Ok(RawProbeResult {
                exit_code: self.exit_code,
                output: self.output.clone(),
                duration: Duration::from_millis(1500),
            })
        }
    }

    #[tokio::test]
    async fn test_probe_pipeline() {
        let runner = FakeRunner::new(
            0,
            "4 packets transmitted, 4 received, 0% packet loss, time 3003ms\n\
             rtt min/avg/max/mdev = 1.0/2.0/3.0/0.5 ms\n",
        );
        let prober = Prober::new(runner.clone()).with_ping_path("/bin/ping");

        let body = prober
            .probe(&ProbeRequest::new("10.0.0.1"))
            .await
            .unwrap()
            .render();

        assert!(body.contains("home_noc_icmp_probe_success 1\n"));
        assert!(body.contains("home_noc_icmp_rtt_avg_seconds 0.002000\n"));
        assert!(body.contains("home_noc_icmp_probe_duration_seconds 1.500000\n"));

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].program, "/bin/ping");
        assert_eq!(seen[0].deadline, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_bracketed_ipv6_dispatch() {
        let runner = FakeRunner::new(1, "");
        let prober = Prober::new(runner.clone());

        let query = ProbeQuery {
            target: Some("[::1]".to_string()),
            ..Default::default()
        };
        let request = ProbeRequest::from_query(&query).unwrap();
        let body = prober.probe(&request).await.unwrap().render();
        assert!(body.contains("home_noc_icmp_probe_success 0\n"));

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen[0].family, AddressFamily::V6);
        assert_eq!(seen[0].args.last().map(String::as_str), Some("::1"));
    }

    #[tokio::test]
    async fn test_debug_lines_configurable() {
        let runner = FakeRunner::new(0, "a\nb\nc\n");
        let prober = Prober::new(runner).with_debug_output_lines(2);

        let mut request = ProbeRequest::new("10.0.0.1");
        request.debug = true;
        let body = prober.probe(&request).await.unwrap().render();

        assert!(body.starts_with(
            "# debug ping_exit_code=0\n# debug ping_output_begin\n# a\n# b\n# debug ping_output_end\n"
        ));
    }
}
