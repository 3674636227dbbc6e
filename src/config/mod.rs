//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. CLI flags (applied by the binary after loading)
//! 2. Environment variables (`TMUXCTL_SESSION`, `TMUXCTL_TMUX_BIN`,
//!    `TMUXCTL_ENTER_DELAY_MS`)
//! 3. TOML file specified via --config CLI flag
//! 4. ./tmuxctl.toml in the current directory
//! 5. $XDG_CONFIG_HOME/tmuxctl/tmuxctl.toml (or ~/.config/tmuxctl/tmuxctl.toml)
//! 6. Built-in defaults

mod defaults;
mod env;
mod init;
mod loader;
mod sources;
mod types;

pub use init::{default_global_config_path, initialize_default_global_config};
pub use loader::load_config;
pub use types::{Config, GlobalConfigInitResult, TimingConfig, TmuxConfig};

use crate::error::ConfigError;
use crate::session::sanitize_tmux_fragment;

/// Default managed session name, `tmuxctl-<hostname>`.
pub(crate) fn default_session_name(host: Option<&str>) -> String {
    let host = host
        .map(str::to_string)
        .or_else(|| {
            hostname::get()
                .ok()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    let fragment = sanitize_tmux_fragment(&host, "local");
    format!("{}-{fragment}", defaults::DEFAULT_SESSION_PREFIX)
}

/// Reject timing combinations that would break polling or verification.
pub(crate) fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let timing = &config.timing;
    if timing.verify_attempts == 0 {
        return Err(ConfigError::Invalid(
            "timing.verify_attempts must be at least 1".into(),
        ));
    }
    if timing.min_poll_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "timing.min_poll_interval_ms must be at least 1".into(),
        ));
    }
    if timing.min_poll_interval_ms > timing.max_poll_interval_ms {
        return Err(ConfigError::Invalid(format!(
            "timing.min_poll_interval_ms ({}) exceeds timing.max_poll_interval_ms ({})",
            timing.min_poll_interval_ms, timing.max_poll_interval_ms
        )));
    }
    if config.tmux.binary.trim().is_empty() {
        return Err(ConfigError::Invalid("tmux.binary must not be empty".into()));
    }
    validate_session_name(&config.tmux.session_name)
}

/// Apply a `--session` flag under the same rules as a configured name.
pub fn apply_session_override(config: &mut Config, session: &str) -> Result<(), ConfigError> {
    validate_session_name(session)?;
    config.tmux.session_name = session.to_string();
    Ok(())
}

fn validate_session_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "tmux.session_name must not be empty".into(),
        ));
    }
    if name.contains([':', '.']) {
        return Err(ConfigError::Invalid(format!(
            "tmux.session_name `{name}` must not contain ':' or '.'"
        )));
    }
    Ok(())
}
