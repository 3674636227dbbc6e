//! Idle detection: wait until a pane's text stops changing.

use serde::Serialize;
use tokio::time::{Duration, Instant};

use crate::address::PaneAddress;
use crate::config::TimingConfig;
use crate::error::ControllerError;
use crate::poll::{poll_pane, PollOutcome, PollSettings};
use crate::tmux::{CaptureRange, Multiplexer};

/// Outcome of [`wait_idle`]; `became_idle = false` means the timeout won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdleReport {
    pub became_idle: bool,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: serde::Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(value.as_secs_f64())
}

/// Poll interval for an idle threshold: a quarter of it, clamped to bounds.
pub fn poll_interval_for(idle_time: Duration, min: Duration, max: Duration) -> Duration {
    (idle_time / 4).clamp(min, max.max(min))
}

/// Block until the pane has been unchanged for `idle_time`, or `timeout`.
///
/// The unchanged period is measured from call start, so a pane that is
/// already quiet reports idle after `idle_time`.
pub async fn wait_idle<M>(
    mux: &M,
    pane: &PaneAddress,
    idle_time: Duration,
    timeout: Duration,
    timing: &TimingConfig,
) -> Result<IdleReport, ControllerError>
where
    M: Multiplexer + ?Sized,
{
    let settings = PollSettings {
        interval: poll_interval_for(
            idle_time,
            timing.min_poll_interval(),
            timing.max_poll_interval(),
        ),
        timeout,
        failure_tolerance: timing.capture_failure_tolerance,
        range: CaptureRange::Visible,
    };

    let mut previous: Option<String> = None;
    let mut last_changed = Instant::now();
    let outcome = poll_pane(mux, pane, &settings, |snapshot| {
        let now = Instant::now();
        match previous.as_deref() {
            Some(text) if text == snapshot.text => {}
            Some(_) => {
                last_changed = now;
                previous = Some(snapshot.text.clone());
            }
            None => previous = Some(snapshot.text.clone()),
        }
        (now.duration_since(last_changed) >= idle_time).then_some(())
    })
    .await?;

    let report = match outcome {
        PollOutcome::Ready { elapsed, .. } => IdleReport {
            became_idle: true,
            elapsed,
        },
        PollOutcome::TimedOut { elapsed, .. } => IdleReport {
            became_idle: false,
            elapsed,
        },
    };
    tracing::debug!(%pane, became_idle = report.became_idle, elapsed = ?report.elapsed, "wait_idle finished");
    Ok(report)
}
