//! Managed-session lifecycle and execution mode.
//!
//! Outside tmux ("remote mode") the controller owns a dedicated session,
//! created on first use and tagged with user options so a later invocation
//! can recognize it. Inside tmux ("local mode") it only addresses panes of the
//! caller's current session and never creates or destroys one.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::address::PaneAddress;
use crate::error::ControllerError;
use crate::tmux::Multiplexer;

/// Session option marking a session created by tmuxctl.
pub(crate) const MANAGED_OPTION: &str = "@tmuxctl_managed";
/// Session option storing `pid@host` of the creating process.
pub(crate) const OWNER_OPTION: &str = "@tmuxctl_owner";
/// Session option storing creation time in unix seconds.
pub(crate) const CREATED_AT_OPTION: &str = "@tmuxctl_created_at";

/// Where the controller is running relative to tmux.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Inside an existing session; `own` is the caller's pane.
    Local { own: PaneAddress },
    /// Outside tmux, driving a controller-owned session.
    Remote,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Remote => "remote",
        }
    }

    pub fn own_pane(&self) -> Option<&PaneAddress> {
        match self {
            Self::Local { own } => Some(own),
            Self::Remote => None,
        }
    }

    pub fn own_session(&self) -> Option<&str> {
        self.own_pane().map(|pane| pane.session.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Active,
    /// Terminal: reached only through `cleanup`.
    Destroyed,
}

/// A tmux session owned by this controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedSession {
    pub name: String,
    /// Unix seconds; `None` until the session exists.
    pub created_at: Option<u64>,
    /// `pid@host` of the process that created the session.
    pub owner: String,
    pub state: SessionState,
}

impl ManagedSession {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: None,
            owner: owner_identity(),
            state: SessionState::Uninitialized,
        }
    }

    /// Rebuild an active session from markers left by an earlier invocation.
    pub fn adopt(name: impl Into<String>, created_at: Option<u64>, owner: Option<String>) -> Self {
        Self {
            name: name.into(),
            created_at,
            owner: owner.unwrap_or_else(|| "unknown".to_string()),
            state: SessionState::Active,
        }
    }

    /// Reject any use after `cleanup`.
    pub fn ensure_usable(&self) -> Result<(), ControllerError> {
        if self.state == SessionState::Destroyed {
            return Err(ControllerError::SessionDestroyed {
                session: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Require an existing session (for `attach` and `list_windows`).
    pub fn ensure_active(&self, operation: &str) -> Result<(), ControllerError> {
        self.ensure_usable()?;
        if self.state != SessionState::Active {
            return Err(ControllerError::not_found(self.name.clone(), operation));
        }
        Ok(())
    }

    /// `Uninitialized -> Active`, recording creation time.
    pub(crate) fn activate(&mut self, created_at: u64) -> Result<(), ControllerError> {
        self.ensure_usable()?;
        self.created_at = Some(created_at);
        self.state = SessionState::Active;
        tracing::info!(session = %self.name, "managed session active");
        Ok(())
    }

    pub(crate) fn destroy(&mut self) {
        self.state = SessionState::Destroyed;
        tracing::info!(session = %self.name, "managed session destroyed");
    }

    /// Write ownership markers onto the live tmux session.
    pub(crate) async fn write_markers<M>(&self, mux: &M) -> Result<(), ControllerError>
    where
        M: Multiplexer + ?Sized,
    {
        mux.set_session_option(&self.name, MANAGED_OPTION, "1").await?;
        mux.set_session_option(&self.name, OWNER_OPTION, &self.owner)
            .await?;
        if let Some(created_at) = self.created_at {
            mux.set_session_option(&self.name, CREATED_AT_OPTION, &created_at.to_string())
                .await?;
        }
        Ok(())
    }
}

/// What tmux currently holds under the managed session name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionProbe {
    Absent,
    Managed {
        created_at: Option<u64>,
        owner: Option<String>,
    },
    /// A session by that name exists but tmuxctl did not create it.
    Unmanaged,
}

pub async fn probe_session<M>(mux: &M, name: &str) -> Result<SessionProbe, ControllerError>
where
    M: Multiplexer + ?Sized,
{
    if !mux.session_exists(name).await? {
        return Ok(SessionProbe::Absent);
    }
    let marker = mux.session_option(name, MANAGED_OPTION).await?;
    if marker.as_deref() != Some("1") {
        return Ok(SessionProbe::Unmanaged);
    }
    let owner = mux.session_option(name, OWNER_OPTION).await?;
    let created_at = mux
        .session_option(name, CREATED_AT_OPTION)
        .await?
        .and_then(|value| value.parse().ok());
    Ok(SessionProbe::Managed { created_at, owner })
}

/// `pid@hostname` for the current process.
pub fn owner_identity() -> String {
    let host = hostname::get()
        .ok()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "{}@{}",
        std::process::id(),
        sanitize_tmux_fragment(&host, "localhost")
    )
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Normalize free text into a tmux-safe name fragment.
pub(crate) fn sanitize_tmux_fragment(raw: &str, fallback: &str) -> String {
    let mut out = String::new();
    let mut previous_dash = false;
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            previous_dash = false;
            continue;
        }
        if matches!(ch, '-' | '_') {
            if !previous_dash && !out.is_empty() {
                out.push(ch);
                previous_dash = true;
            }
            continue;
        }
        // Everything else (including ':' and '.', which tmux treats as
        // target separators) collapses into a single dash.
        if !previous_dash && !out.is_empty() {
            out.push('-');
            previous_dash = true;
        }
    }
    let trimmed = out.trim_matches(['-', '_']).to_string();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.chars().take(48).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::FakeMux;

    #[test]
    fn sanitize_collapses_separators() {
        assert_eq!(sanitize_tmux_fragment("Dev.Box:local", "x"), "dev-box-local");
        assert_eq!(sanitize_tmux_fragment("  --  ", "fallback"), "fallback");
        assert_eq!(sanitize_tmux_fragment("a__b", "x"), "a_b");
        assert_eq!(sanitize_tmux_fragment(&"z".repeat(80), "x").len(), 48);
    }

    #[test]
    fn lifecycle_transitions() {
        let mut session = ManagedSession::new("tmuxctl-box");
        assert_eq!(session.state, SessionState::Uninitialized);
        assert!(session.ensure_usable().is_ok());
        assert!(session.ensure_active("attach").unwrap_err().is_target_not_found());

        session.activate(1_700_000_000).unwrap();
        assert_eq!(session.state, SessionState::Active);
        assert_eq!(session.created_at, Some(1_700_000_000));
        assert!(session.ensure_active("attach").is_ok());

        session.destroy();
        let err = session.ensure_usable().unwrap_err();
        assert_eq!(err.kind(), "session_destroyed");
        assert!(session.activate(1).is_err(), "destroyed is terminal");
    }

    #[test]
    fn owner_identity_embeds_pid() {
        let owner = owner_identity();
        let (pid, host) = owner.split_once('@').unwrap();
        assert_eq!(pid, std::process::id().to_string());
        assert!(!host.is_empty());
    }

    #[test]
    fn mode_exposes_own_location() {
        let local = Mode::Local {
            own: PaneAddress::new("work", 0, 1),
        };
        assert_eq!(local.own_session(), Some("work"));
        assert_eq!(local.name(), "local");
        assert_eq!(Mode::Remote.own_pane(), None);
    }

    #[tokio::test]
    async fn probe_reads_markers_back() {
        let mux = FakeMux::new();
        assert_eq!(probe_session(&mux, "s").await.unwrap(), SessionProbe::Absent);

        mux.add_session("s", 0, 1);
        assert_eq!(probe_session(&mux, "s").await.unwrap(), SessionProbe::Unmanaged);

        let mut session = ManagedSession::new("s");
        session.activate(42).unwrap();
        session.write_markers(&mux).await.unwrap();
        assert_eq!(
            probe_session(&mux, "s").await.unwrap(),
            SessionProbe::Managed {
                created_at: Some(42),
                owner: Some(session.owner.clone()),
            }
        );
    }
}
