//! `tmuxctl init`: write the embedded default config into the user config dir.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConfigError;

use super::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CONFIG_TEMPLATE};
use super::GlobalConfigInitResult;

/// `$XDG_CONFIG_HOME`, else `~/.config`, else the platform config dir.
pub(super) fn config_root_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .or_else(dirs::config_dir)
}

/// Where `tmuxctl init` writes: `<config root>/tmuxctl/tmuxctl.toml`.
pub fn default_global_config_path() -> Option<PathBuf> {
    config_root_dir().map(|root| root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn initialize_default_global_config(
    force: bool,
) -> Result<GlobalConfigInitResult, ConfigError> {
    let path = default_global_config_path().ok_or_else(|| {
        ConfigError::Invalid("no home or XDG config directory to place tmuxctl.toml in".into())
    })?;
    initialize_config_at_path(&path, force)
}

/// Write the template to `path`. An existing file is left alone unless
/// `force` is set, in which case it is copied aside first.
pub(super) fn initialize_config_at_path(
    path: &Path,
    force: bool,
) -> Result<GlobalConfigInitResult, ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let path_buf = path.to_path_buf();
    match write_template_if_absent(path) {
        Ok(()) => Ok(GlobalConfigInitResult::Created { path: path_buf }),
        Err(err) if err.kind() == ErrorKind::AlreadyExists && !force => {
            Ok(GlobalConfigInitResult::AlreadyInitialized { path: path_buf })
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            let backup_path = backup_path_for(path);
            fs::copy(path, &backup_path)?;
            fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
            Ok(GlobalConfigInitResult::Overwritten {
                path: path_buf,
                backup_path,
            })
        }
        Err(err) => Err(err.into()),
    }
}

/// Create-new write, so a concurrent `init` cannot clobber a user file.
fn write_template_if_absent(path: &Path) -> io::Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?
        .write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())
}

/// `<file>.<epoch secs>.bak` beside `path`, numbered when that name is taken.
fn backup_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| CONFIG_FILE_NAME.into(), |name| name.to_string_lossy().into_owned());
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    let numbered = |n: u32| match n {
        0 => path.with_file_name(format!("{name}.{stamp}.bak")),
        n => path.with_file_name(format!("{name}.{stamp}.{n}.bak")),
    };
    (0..1000)
        .map(numbered)
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.with_file_name(format!("{name}.{stamp}.{}.bak", std::process::id())))
}
