//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::defaults::{DEFAULT_TMUX_BINARY, FALLBACK_SHELL};
use super::env::apply_runtime_env_overrides;
use super::init::config_root_dir;
use super::sources::read_config_text_with_sources;
use super::types::FileConfig;
use super::{default_session_name, validate_config, Config, TmuxConfig};

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

pub(super) fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<Config, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root)?;
    tracing::debug!(?source, "loaded config source");
    let parsed: FileConfig = toml::from_str(&config_text)?;

    let shell = parsed
        .tmux
        .shell
        .or_else(|| env_lookup("SHELL"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_SHELL.to_string());
    let mut config = Config {
        tmux: TmuxConfig {
            binary: parsed
                .tmux
                .binary
                .unwrap_or_else(|| DEFAULT_TMUX_BINARY.to_string()),
            session_name: parsed
                .tmux
                .session_name
                .unwrap_or_else(|| default_session_name(None)),
            shell,
        },
        timing: parsed.timing,
    };
    apply_runtime_env_overrides(&mut config, &env_lookup)?;
    validate_config(&config)?;
    Ok(config)
}
