//! Unified error types for the controller.

use std::fmt;

// ---------------------------------------------------------------------------
// ControllerError
// ---------------------------------------------------------------------------

/// Errors surfaced by controller operations.
///
/// Timeouts are not errors here: `wait_idle` and `execute` report them as
/// values (`became_idle = false`, `exit_code = -1`).
#[derive(Debug)]
pub enum ControllerError {
    /// The raw pane identifier is syntactically malformed.
    InvalidAddress { raw: String, reason: String },
    /// The pane/window/session does not exist (or vanished mid-operation).
    TargetNotFound { target: String, operation: String },
    /// Enter was never observed to register after all verification attempts.
    DeliveryFailed {
        operation: String,
        target: String,
        attempts: u32,
    },
    /// A destructive operation aimed at the caller's own pane or session.
    SelfTargetRefused { target: String, operation: String },
    /// The operation is only available for a controller-owned session.
    ModeNotSupported { operation: String },
    /// The managed session was cleaned up; no further operations allowed.
    SessionDestroyed { session: String },
    /// The session exists but was not created by this controller.
    NotManaged { session: String },
    /// The multiplexer binary is missing or unusable.
    MultiplexerUnavailable(String),
    /// A multiplexer command failed for a reason other than a missing target.
    CommandFailed {
        operation: String,
        target: String,
        details: String,
    },
    Config(ConfigError),
}

impl ControllerError {
    /// Stable machine-readable kind used by CLI JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAddress { .. } => "invalid_address",
            Self::TargetNotFound { .. } => "target_not_found",
            Self::DeliveryFailed { .. } => "delivery_failed",
            Self::SelfTargetRefused { .. } => "self_target_refused",
            Self::ModeNotSupported { .. } => "mode_not_supported",
            Self::SessionDestroyed { .. } => "session_destroyed",
            Self::NotManaged { .. } => "not_managed",
            Self::MultiplexerUnavailable(_) => "multiplexer_unavailable",
            Self::CommandFailed { .. } => "command_failed",
            Self::Config(_) => "config",
        }
    }

    pub fn is_target_not_found(&self) -> bool {
        matches!(self, Self::TargetNotFound { .. })
    }

    /// Transient failures may be retried locally by polling loops.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::CommandFailed { .. })
    }

    pub(crate) fn invalid_address(raw: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(target: impl Into<String>, operation: &str) -> Self {
        Self::TargetNotFound {
            target: target.into(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn mode_not_supported(operation: &str) -> Self {
        Self::ModeNotSupported {
            operation: operation.to_string(),
        }
    }
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress { raw, reason } => {
                write!(f, "invalid pane address `{raw}`: {reason}")
            }
            Self::TargetNotFound { target, operation } => {
                write!(f, "{operation}: target `{target}` not found")
            }
            Self::DeliveryFailed {
                operation,
                target,
                attempts,
            } => write!(
                f,
                "{operation}: Enter did not register in pane `{target}` after {attempts} attempts"
            ),
            Self::SelfTargetRefused { target, operation } => write!(
                f,
                "{operation}: refusing to act on `{target}`, it is the caller's own location"
            ),
            Self::ModeNotSupported { operation } => write!(
                f,
                "{operation}: only available outside tmux, for the session this controller manages"
            ),
            Self::SessionDestroyed { session } => {
                write!(f, "managed session `{session}` has been cleaned up")
            }
            Self::NotManaged { session } => {
                write!(f, "tmux session `{session}` is not managed by tmuxctl")
            }
            Self::MultiplexerUnavailable(msg) => write!(f, "tmux unavailable: {msg}"),
            Self::CommandFailed {
                operation,
                target,
                details,
            } => write!(f, "{operation} on `{target}` failed: {details}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}
