//! Environment overrides applied on top of file config.

use crate::error::ConfigError;

use super::Config;

pub(super) const ENV_SESSION: &str = "TMUXCTL_SESSION";
pub(super) const ENV_TMUX_BIN: &str = "TMUXCTL_TMUX_BIN";
pub(super) const ENV_ENTER_DELAY_MS: &str = "TMUXCTL_ENTER_DELAY_MS";

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(session) = non_empty(env_lookup(ENV_SESSION)) {
        config.tmux.session_name = session;
    }
    if let Some(binary) = non_empty(env_lookup(ENV_TMUX_BIN)) {
        config.tmux.binary = binary;
    }
    if let Some(delay) = non_empty(env_lookup(ENV_ENTER_DELAY_MS)) {
        config.timing.enter_delay_ms = delay.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid {ENV_ENTER_DELAY_MS} value `{delay}`: expected integer milliseconds"
            ))
        })?;
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
