//! Default configuration constants.
//!
//! Keeping defaults in one module lets the template, the serde defaults and
//! the tests share the same literals.

/// Embedded default `tmuxctl.toml` template written by `tmuxctl init`.
pub(super) const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/tmuxctl.toml");
/// Config file name used for local and global lookups.
pub(super) const CONFIG_FILE_NAME: &str = "tmuxctl.toml";
/// Directory under the user config root holding the global config.
pub(super) const CONFIG_DIR_NAME: &str = "tmuxctl";
/// Default multiplexer binary.
pub(super) const DEFAULT_TMUX_BINARY: &str = "tmux";
/// Prefix for the default managed session name.
pub(super) const DEFAULT_SESSION_PREFIX: &str = "tmuxctl";
/// Shell used by `launch` when neither config nor `$SHELL` name one.
pub(super) const FALLBACK_SHELL: &str = "sh";

pub(super) const DEFAULT_ENTER_DELAY_MS: u64 = 1500;
pub(super) const DEFAULT_VERIFY_ATTEMPTS: u32 = 3;
pub(super) const DEFAULT_VERIFY_BACKOFF_MS: u64 = 300;
pub(super) const DEFAULT_MIN_POLL_INTERVAL_MS: u64 = 50;
pub(super) const DEFAULT_MAX_POLL_INTERVAL_MS: u64 = 500;
pub(super) const DEFAULT_IDLE_TIME_MS: u64 = 2000;
pub(super) const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 30;
pub(super) const DEFAULT_EXECUTE_TIMEOUT_SECS: u64 = 30;
pub(super) const DEFAULT_CAPTURE_FAILURE_TOLERANCE: u32 = 3;
