//! Verified keystroke delivery.
//!
//! `send-keys` is fire-and-forget: a TUI that is still redrawing can swallow
//! Enter. After pressing Enter we compare the screen and cursor against a
//! reading taken just before. tmux pads the visible screen with blank rows,
//! so an Enter that only moves the cursor to a fresh line shows up in the
//! cursor alone. Without a change, Enter is retried with a growing backoff
//! until the attempt budget runs out.

use serde::Serialize;
use tokio::time::{sleep_until, Duration, Instant};

use crate::address::PaneAddress;
use crate::config::TimingConfig;
use crate::error::ControllerError;
use crate::tmux::{CaptureRange, CursorPosition, Key, Multiplexer};

/// Pause between retries of a failed screen read.
const READ_RETRY_PAUSE: Duration = Duration::from_millis(50);

/// How `send_verified` should deliver text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOptions {
    pub press_enter: bool,
    /// Pause between typing the text and pressing Enter.
    pub enter_delay: Duration,
    /// When false, Enter is pressed once and not checked.
    pub verify: bool,
    pub attempts: u32,
    pub backoff: Duration,
    /// Consecutive transient screen-read failures tolerated per reading.
    pub failure_tolerance: u32,
}

impl DeliveryOptions {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            press_enter: true,
            enter_delay: timing.enter_delay(),
            verify: true,
            attempts: timing.verify_attempts.max(1),
            backoff: timing.verify_backoff(),
            failure_tolerance: timing.capture_failure_tolerance,
        }
    }
}

/// What happened during delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Enter presses performed (0 when Enter was not requested).
    pub enter_presses: u32,
    /// Whether a screen change confirmed the Enter.
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ScreenState {
    text: String,
    cursor: CursorPosition,
}

/// Send `text` to `pane`, then press Enter and confirm it registered.
///
/// `operation` names the caller in a `DeliveryFailed` error.
pub async fn send_verified<M>(
    mux: &M,
    pane: &PaneAddress,
    text: &str,
    options: &DeliveryOptions,
    operation: &str,
) -> Result<DeliveryReport, ControllerError>
where
    M: Multiplexer + ?Sized,
{
    let report = deliver(mux, pane, text, options, operation, None).await?;
    report.ok_or_else(|| delivery_failed(operation, pane, options.attempts.max(1)))
}

/// Like [`send_verified`], but never waits past `deadline`.
///
/// The Enter delay and retry backoff are cut short at the deadline. Returns
/// `Ok(None)` when the deadline passes before Enter is confirmed.
pub(crate) async fn send_verified_before<M>(
    mux: &M,
    pane: &PaneAddress,
    text: &str,
    options: &DeliveryOptions,
    operation: &str,
    deadline: Instant,
) -> Result<Option<DeliveryReport>, ControllerError>
where
    M: Multiplexer + ?Sized,
{
    deliver(mux, pane, text, options, operation, Some(deadline)).await
}

async fn deliver<M>(
    mux: &M,
    pane: &PaneAddress,
    text: &str,
    options: &DeliveryOptions,
    operation: &str,
    deadline: Option<Instant>,
) -> Result<Option<DeliveryReport>, ControllerError>
where
    M: Multiplexer + ?Sized,
{
    if !text.is_empty() {
        mux.send_text(pane, text).await?;
    }
    if !options.press_enter {
        return Ok(Some(DeliveryReport {
            enter_presses: 0,
            verified: false,
        }));
    }

    pause(options.enter_delay, deadline).await;

    if !options.verify {
        mux.send_key(pane, Key::Enter).await?;
        return Ok(Some(DeliveryReport {
            enter_presses: 1,
            verified: false,
        }));
    }

    let attempts = options.attempts.max(1);
    for attempt in 1..=attempts {
        let before = observe(mux, pane, options, deadline).await?;
        mux.send_key(pane, Key::Enter).await?;
        pause(options.backoff * attempt, deadline).await;
        let after = observe(mux, pane, options, deadline).await?;
        if after != before {
            if attempt > 1 {
                tracing::info!(%pane, attempt, "Enter registered after retry");
            }
            return Ok(Some(DeliveryReport {
                enter_presses: attempt,
                verified: true,
            }));
        }
        tracing::debug!(%pane, attempt, "no screen change after Enter");
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            tracing::debug!(%pane, attempt, "deadline passed before Enter registered");
            return Ok(None);
        }
    }

    tracing::warn!(%pane, attempts, "Enter never registered");
    Err(delivery_failed(operation, pane, attempts))
}

fn delivery_failed(operation: &str, pane: &PaneAddress, attempts: u32) -> ControllerError {
    ControllerError::DeliveryFailed {
        operation: operation.to_string(),
        target: pane.to_string(),
        attempts,
    }
}

/// Read the visible screen and cursor, retrying transient failures.
async fn observe<M>(
    mux: &M,
    pane: &PaneAddress,
    options: &DeliveryOptions,
    deadline: Option<Instant>,
) -> Result<ScreenState, ControllerError>
where
    M: Multiplexer + ?Sized,
{
    let mut failures = 0u32;
    loop {
        match read_screen(mux, pane).await {
            Ok(state) => return Ok(state),
            Err(err) if err.is_transient() && failures < options.failure_tolerance => {
                failures += 1;
                tracing::debug!(%pane, failures, error = %err, "screen read failed; retrying");
                pause(READ_RETRY_PAUSE, deadline).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn read_screen<M>(mux: &M, pane: &PaneAddress) -> Result<ScreenState, ControllerError>
where
    M: Multiplexer + ?Sized,
{
    let snapshot = mux.capture_text(pane, CaptureRange::Visible).await?;
    let cursor = mux.cursor_position(pane).await?;
    Ok(ScreenState {
        text: snapshot.text,
        cursor,
    })
}

/// Sleep for `delay`, waking no later than `deadline`.
async fn pause(delay: Duration, deadline: Option<Instant>) {
    if delay.is_zero() {
        return;
    }
    let wake = Instant::now() + delay;
    sleep_until(deadline.map_or(wake, |deadline| wake.min(deadline))).await;
}
