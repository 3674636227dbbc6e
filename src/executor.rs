//! Command execution over the sentinel protocol.

use serde::Serialize;
use tokio::time::{Duration, Instant};

use crate::address::PaneAddress;
use crate::config::TimingConfig;
use crate::delivery::{send_verified_before, DeliveryOptions};
use crate::error::ControllerError;
use crate::poll::{poll_pane, PollOutcome, PollSettings};
use crate::protocol::{SentinelProtocol, SentinelToken};
use crate::tmux::{format_duration, CaptureRange, Multiplexer};

/// Result of [`execute`]. `exit_code == -1` means the run timed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub output: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub const TIMED_OUT: i32 = -1;

    pub fn timed_out(&self) -> bool {
        self.exit_code == Self::TIMED_OUT
    }
}

/// Timing for one [`execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Covers delivery and the wait for the end marker.
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub failure_tolerance: u32,
    pub delivery: DeliveryOptions,
}

impl ExecuteOptions {
    pub fn from_timing(timing: &TimingConfig, timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: timing.min_poll_interval(),
            failure_tolerance: timing.capture_failure_tolerance,
            delivery: DeliveryOptions::from_timing(timing),
        }
    }
}

/// Run `command` in the shell of `pane` and recover its output and exit code.
///
/// The timeout covers delivery as well as the wait for the end marker. A
/// timeout is reported as `exit_code = -1` with whatever output was visible;
/// the command may still be running in the pane.
pub async fn execute<M>(
    mux: &M,
    pane: &PaneAddress,
    command: &str,
    options: &ExecuteOptions,
) -> Result<ExecutionResult, ControllerError>
where
    M: Multiplexer + ?Sized,
{
    let deadline = Instant::now() + options.timeout;
    let protocol = SentinelProtocol::new(SentinelToken::generate());
    tracing::debug!(%pane, token = protocol.token().as_str(), "execute");

    let delivered = send_verified_before(
        mux,
        pane,
        &protocol.wrap(command),
        &options.delivery,
        "execute",
        deadline,
    )
    .await?;
    if delivered.is_none() {
        tracing::info!(
            %pane,
            timeout = %format_duration(options.timeout),
            "execute timed out during delivery"
        );
        let output = match mux.capture_text(pane, CaptureRange::History).await {
            Ok(snapshot) => protocol.partial_output(&snapshot.text),
            Err(err) => {
                tracing::debug!(%pane, error = %err, "final capture failed");
                String::new()
            }
        };
        return Ok(ExecutionResult {
            output,
            exit_code: ExecutionResult::TIMED_OUT,
        });
    }

    let settings = PollSettings {
        interval: options.poll_interval,
        timeout: deadline.saturating_duration_since(Instant::now()),
        failure_tolerance: options.failure_tolerance,
        range: CaptureRange::History,
    };
    let outcome = poll_pane(mux, pane, &settings, |snapshot| {
        protocol.find_completion(&snapshot.text)
    })
    .await?;

    Ok(match outcome {
        PollOutcome::Ready { value, .. } => ExecutionResult {
            output: value.output,
            exit_code: value.exit_code,
        },
        PollOutcome::TimedOut { last, .. } => {
            tracing::info!(%pane, timeout = %format_duration(options.timeout), "execute timed out");
            ExecutionResult {
                output: last
                    .map(|snapshot| protocol.partial_output(&snapshot.text))
                    .unwrap_or_default(),
                exit_code: ExecutionResult::TIMED_OUT,
            }
        }
    })
}
