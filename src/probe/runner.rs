//! External process execution.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::time::timeout;

use super::{PingCommand, ProbeError};

/// Exit code reported when the tool was killed or ended by a signal.
pub const KILLED_EXIT_CODE: i32 = -1;

/// Default slack on top of the tool's own deadline before it is killed.
pub const DEFAULT_DEADLINE_GRACE: Duration = Duration::from_secs(2);

/// Captured outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProbeResult {
    /// Tool-defined exit code; not an error signal by itself.
    pub exit_code: i32,
    /// Standard output followed by standard error.
    pub output: String,
    /// Wall-clock time from launch to exit.
    pub duration: Duration,
}

/// Runs a [`PingCommand`] and captures its output.
///
/// Implementations must not treat a non-zero exit code as an error; only a
/// failure to launch the tool is reported as [`ProbeError::ToolLaunch`].
#[async_trait::async_trait]
pub trait ProcessRunner: Send + Sync + 'static {
    async fn run(&self, command: &PingCommand) -> Result<RawProbeResult, ProbeError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    grace: Duration,
}

impl SystemRunner {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE_GRACE)
    }
}

#[async_trait::async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, command: &PingCommand) -> Result<RawProbeResult, ProbeError> {
        let start = Instant::now();
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProbeError::ToolLaunch {
                program: command.program.clone(),
                source,
            })?;

        // The child is owned by a detached task, so a caller that stops
        // waiting does not stop the burst; only the ceiling kills it.
        let ceiling = command.deadline + self.grace;
        let program = command.program.clone();
        let supervisor = tokio::spawn(supervise(child, ceiling, program, start));

        match supervisor.await {
            Ok(raw) => Ok(raw),
            Err(e) => {
                tracing::error!(program = %command.program, error = %e, "Ping supervisor task failed");
                Ok(killed(start.elapsed()))
            }
        }
    }
}

/// Wait for `child` up to `ceiling`, killing it once the ceiling passes.
async fn supervise(
    mut child: Child,
    ceiling: Duration,
    program: String,
    start: Instant,
) -> RawProbeResult {
    let outcome = timeout(ceiling, collect(&mut child)).await;
    match outcome {
        Ok(Ok((status, stdout, stderr))) => {
            let mut text = String::from_utf8_lossy(&stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&stderr));
            RawProbeResult {
                exit_code: status.code().unwrap_or(KILLED_EXIT_CODE),
                output: text,
                duration: start.elapsed(),
            }
        }
        Ok(Err(e)) => {
            // Lost the child's pipes after a successful spawn; report as
            // a burst with no replies.
            tracing::warn!(program = %program, error = %e, "Failed to collect ping output");
            killed(start.elapsed())
        }
        Err(_) => {
            if let Err(e) = child.kill().await {
                tracing::warn!(program = %program, error = %e, "Failed to kill ping");
            }
            tracing::warn!(
                program = %program,
                ceiling_ms = ceiling.as_millis(),
                "Ping exceeded its deadline, killed"
            );
            killed(start.elapsed())
        }
    }
}

/// Drain both pipes while waiting for the exit status.
async fn collect(child: &mut Child) -> io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let read_stdout = async {
        if let Some(pipe) = stdout_pipe.as_mut() {
            pipe.read_to_end(&mut stdout).await?;
        }
        Ok::<_, io::Error>(())
    };
    let read_stderr = async {
        if let Some(pipe) = stderr_pipe.as_mut() {
            pipe.read_to_end(&mut stderr).await?;
        }
        Ok::<_, io::Error>(())
    };

    let (status, out, err) = tokio::join!(child.wait(), read_stdout, read_stderr);
    out?;
    err?;
    Ok((status?, stdout, stderr))
}

fn killed(duration: Duration) -> RawProbeResult {
    RawProbeResult {
        exit_code: KILLED_EXIT_CODE,
        output: String::new(),
        duration,
    }
}
