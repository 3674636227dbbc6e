//! Configuration data model.
//!
//! This module holds struct definitions plus default values. Source lookup
//! and env overrides live in `loader`/`sources`/`env` so precedence stays
//! centralized.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults::{
    DEFAULT_CAPTURE_FAILURE_TOLERANCE, DEFAULT_ENTER_DELAY_MS, DEFAULT_EXECUTE_TIMEOUT_SECS,
    DEFAULT_IDLE_TIME_MS, DEFAULT_MAX_POLL_INTERVAL_MS, DEFAULT_MIN_POLL_INTERVAL_MS,
    DEFAULT_TMUX_BINARY, DEFAULT_VERIFY_ATTEMPTS, DEFAULT_VERIFY_BACKOFF_MS,
    DEFAULT_WAIT_TIMEOUT_SECS,
};

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub tmux: TmuxConfig,
    pub timing: TimingConfig,
}

/// Resolved multiplexer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TmuxConfig {
    /// Binary invoked for every multiplexer call.
    pub binary: String,
    /// Session created and owned in remote mode.
    pub session_name: String,
    /// Command started by `launch` when none is given.
    pub shell: String,
}

/// Timing knobs for delivery verification and polling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub enter_delay_ms: u64,
    pub verify_attempts: u32,
    pub verify_backoff_ms: u64,
    pub min_poll_interval_ms: u64,
    pub max_poll_interval_ms: u64,
    pub idle_time_ms: u64,
    pub wait_timeout_secs: u64,
    pub execute_timeout_secs: u64,
    pub capture_failure_tolerance: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            enter_delay_ms: DEFAULT_ENTER_DELAY_MS,
            verify_attempts: DEFAULT_VERIFY_ATTEMPTS,
            verify_backoff_ms: DEFAULT_VERIFY_BACKOFF_MS,
            min_poll_interval_ms: DEFAULT_MIN_POLL_INTERVAL_MS,
            max_poll_interval_ms: DEFAULT_MAX_POLL_INTERVAL_MS,
            idle_time_ms: DEFAULT_IDLE_TIME_MS,
            wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
            execute_timeout_secs: DEFAULT_EXECUTE_TIMEOUT_SECS,
            capture_failure_tolerance: DEFAULT_CAPTURE_FAILURE_TOLERANCE,
        }
    }
}

impl TimingConfig {
    pub fn enter_delay(&self) -> Duration {
        Duration::from_millis(self.enter_delay_ms)
    }

    pub fn verify_backoff(&self) -> Duration {
        Duration::from_millis(self.verify_backoff_ms)
    }

    pub fn min_poll_interval(&self) -> Duration {
        Duration::from_millis(self.min_poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    pub fn idle_time(&self) -> Duration {
        Duration::from_millis(self.idle_time_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }
}

/// `[tmux]` table as written on disk; unset fields resolve at load time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileTmuxConfig {
    pub(super) binary: Option<String>,
    pub(super) session_name: Option<String>,
    pub(super) shell: Option<String>,
}

/// Raw file shape parsed by `toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileConfig {
    pub(super) tmux: FileTmuxConfig,
    pub(super) timing: TimingConfig,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_TMUX_BINARY.to_string(),
            session_name: super::default_session_name(None),
            shell: super::defaults::FALLBACK_SHELL.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmux: TmuxConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

/// Outcome of `tmuxctl init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalConfigInitResult {
    Created { path: std::path::PathBuf },
    AlreadyInitialized { path: std::path::PathBuf },
    Overwritten {
        path: std::path::PathBuf,
        backup_path: std::path::PathBuf,
    },
}
