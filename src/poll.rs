//! Shared capture-polling loop used by idle detection and command execution.

use tokio::time::{sleep, Duration, Instant};

use crate::address::PaneAddress;
use crate::error::ControllerError;
use crate::tmux::{CaptureRange, CaptureSnapshot, Multiplexer};

/// Loop parameters for [`poll_pane`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
    /// Consecutive failed captures tolerated before giving up.
    pub failure_tolerance: u32,
    pub range: CaptureRange,
}

/// Result of a polling loop. Timing out is an ordinary outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready {
        value: T,
        snapshot: CaptureSnapshot,
        elapsed: Duration,
    },
    TimedOut {
        /// Most recent successful capture, if any.
        last: Option<CaptureSnapshot>,
        elapsed: Duration,
    },
}

/// Capture `pane` repeatedly until `predicate` yields a value or the timeout
/// passes.
///
/// The predicate is evaluated before the deadline check, so a capture taken
/// exactly at the deadline still counts. Sleeps never overshoot the deadline.
/// Isolated capture failures are retried; a vanished pane is surfaced at once.
pub async fn poll_pane<M, T, F>(
    mux: &M,
    pane: &PaneAddress,
    settings: &PollSettings,
    mut predicate: F,
) -> Result<PollOutcome<T>, ControllerError>
where
    M: Multiplexer + ?Sized,
    F: FnMut(&CaptureSnapshot) -> Option<T>,
{
    let start = Instant::now();
    let deadline = start + settings.timeout;
    let mut failures = 0u32;
    let mut last = None;

    loop {
        match mux.capture_text(pane, settings.range).await {
            Ok(snapshot) => {
                failures = 0;
                if let Some(value) = predicate(&snapshot) {
                    return Ok(PollOutcome::Ready {
                        value,
                        snapshot,
                        elapsed: start.elapsed(),
                    });
                }
                last = Some(snapshot);
            }
            Err(err) if err.is_transient() && failures < settings.failure_tolerance => {
                failures += 1;
                tracing::debug!(%pane, failures, error = %err, "capture failed; retrying");
            }
            Err(err) => return Err(err),
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(%pane, timeout = ?settings.timeout, "poll timed out");
            return Ok(PollOutcome::TimedOut {
                last,
                elapsed: now - start,
            });
        }
        sleep(settings.interval.min(deadline - now)).await;
    }
}
