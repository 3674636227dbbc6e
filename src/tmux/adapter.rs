//! Stateless multiplexer façade.
//!
//! `Multiplexer` is the seam every higher layer talks to; `TmuxAdapter` is the
//! production implementation backed by the tmux binary. Tests substitute an
//! in-memory fake.

use async_trait::async_trait;

use crate::address::{PaneAddress, PaneTarget};
use crate::error::ControllerError;

use super::commands::{self, Key};
use super::panes::{
    parse_cursor, parse_pane_line, parse_pane_list, parse_window_list, CaptureRange,
    CaptureSnapshot, CursorPosition, PaneInfo, PaneScope, WindowInfo,
};
use super::process::{ensure_success, probe_version, render_command_line, run_process, ExecOutput};

/// Operations against the terminal multiplexer.
///
/// Every call that names a pane, window, or session reports
/// `TargetNotFound` when the target has disappeared.
#[async_trait]
pub trait Multiplexer: Send + Sync {
    /// Create a detached session; returns its first pane.
    async fn create_session(
        &self,
        name: &str,
        command: Option<&str>,
    ) -> Result<PaneInfo, ControllerError>;

    /// Append a window to `session`; returns its pane.
    async fn create_window(
        &self,
        session: &str,
        command: Option<&str>,
    ) -> Result<PaneInfo, ControllerError>;

    /// Split the window holding `beside`; returns the new pane.
    async fn create_pane(
        &self,
        beside: &PaneAddress,
        command: Option<&str>,
        vertical: bool,
    ) -> Result<PaneInfo, ControllerError>;

    /// Inject `text` literally, without pressing Enter.
    async fn send_text(&self, pane: &PaneAddress, text: &str) -> Result<(), ControllerError>;

    async fn send_key(&self, pane: &PaneAddress, key: Key) -> Result<(), ControllerError>;

    async fn capture_text(
        &self,
        pane: &PaneAddress,
        range: CaptureRange,
    ) -> Result<CaptureSnapshot, ControllerError>;

    /// Cursor cell; moves when Enter lands even if no text changes.
    async fn cursor_position(&self, pane: &PaneAddress) -> Result<CursorPosition, ControllerError>;

    async fn list_panes(&self, scope: &PaneScope) -> Result<Vec<PaneInfo>, ControllerError>;

    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, ControllerError>;

    async fn kill_pane(&self, pane: &PaneAddress) -> Result<(), ControllerError>;

    async fn kill_session(&self, name: &str) -> Result<(), ControllerError>;

    async fn session_exists(&self, name: &str) -> Result<bool, ControllerError>;

    /// Look up one pane; the existence check behind address resolution.
    async fn describe_pane(&self, target: &PaneTarget) -> Result<PaneInfo, ControllerError>;

    async fn set_session_option(
        &self,
        session: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ControllerError>;

    /// `None` when the option is unset.
    async fn session_option(
        &self,
        session: &str,
        key: &str,
    ) -> Result<Option<String>, ControllerError>;

    /// Attach the calling terminal to `session`; returns when the client detaches.
    async fn attach(&self, session: &str) -> Result<(), ControllerError>;

}

/// tmux-binary implementation of [`Multiplexer`].
#[derive(Debug, Clone)]
pub struct TmuxAdapter {
    binary: String,
}

impl TmuxAdapter {
    /// Build an adapter without probing the binary.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Build an adapter after confirming `binary -V` works.
    ///
    /// A missing binary is fatal for every operation, so it is reported once
    /// up front as `MultiplexerUnavailable`.
    pub async fn connect(binary: impl Into<String>) -> Result<Self, ControllerError> {
        let adapter = Self::new(binary);
        let version = probe_version(&adapter.binary).await?;
        tracing::debug!(binary = %adapter.binary, %version, "tmux available");
        Ok(adapter)
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    async fn run(
        &self,
        operation: &str,
        target: &str,
        args: Vec<String>,
    ) -> Result<ExecOutput, ControllerError> {
        tracing::debug!(
            operation,
            command = %render_command_line(&self.binary, &args),
            "tmux call"
        );
        let output = run_process(&self.binary, &args).await?;
        ensure_success(output, operation, target)
    }

    fn parse_created(
        &self,
        operation: &str,
        target: &str,
        output: ExecOutput,
    ) -> Result<PaneInfo, ControllerError> {
        parse_pane_line(output.stdout.trim()).ok_or_else(|| ControllerError::CommandFailed {
            operation: operation.to_string(),
            target: target.to_string(),
            details: format!("unexpected tmux output `{}`", output.stdout.trim()),
        })
    }
}

#[async_trait]
impl Multiplexer for TmuxAdapter {
    async fn create_session(
        &self,
        name: &str,
        command: Option<&str>,
    ) -> Result<PaneInfo, ControllerError> {
        let output = self
            .run("create_session", name, commands::new_session(name, command))
            .await?;
        self.parse_created("create_session", name, output)
    }

    async fn create_window(
        &self,
        session: &str,
        command: Option<&str>,
    ) -> Result<PaneInfo, ControllerError> {
        let output = self
            .run("create_window", session, commands::new_window(session, command))
            .await?;
        self.parse_created("create_window", session, output)
    }

    async fn create_pane(
        &self,
        beside: &PaneAddress,
        command: Option<&str>,
        vertical: bool,
    ) -> Result<PaneInfo, ControllerError> {
        let target = beside.to_string();
        let output = self
            .run(
                "create_pane",
                &target,
                commands::split_window(&beside.tmux_target(), vertical, command),
            )
            .await?;
        self.parse_created("create_pane", &target, output)
    }

    async fn send_text(&self, pane: &PaneAddress, text: &str) -> Result<(), ControllerError> {
        self.run(
            "send",
            &pane.to_string(),
            commands::send_literal(&pane.tmux_target(), text),
        )
        .await
        .map(|_| ())
    }

    async fn send_key(&self, pane: &PaneAddress, key: Key) -> Result<(), ControllerError> {
        self.run(
            "send_key",
            &pane.to_string(),
            commands::send_key(&pane.tmux_target(), key),
        )
        .await
        .map(|_| ())
    }

    async fn capture_text(
        &self,
        pane: &PaneAddress,
        range: CaptureRange,
    ) -> Result<CaptureSnapshot, ControllerError> {
        let output = self
            .run(
                "capture",
                &pane.to_string(),
                commands::capture(&pane.tmux_target(), range),
            )
            .await?;
        Ok(CaptureSnapshot::new(pane.clone(), output.stdout))
    }

    async fn cursor_position(&self, pane: &PaneAddress) -> Result<CursorPosition, ControllerError> {
        let target = pane.to_string();
        let output = self
            .run(
                "cursor",
                &target,
                commands::cursor_position(&pane.tmux_target()),
            )
            .await?;
        parse_cursor(&output.stdout).ok_or_else(|| ControllerError::CommandFailed {
            operation: "cursor".to_string(),
            target,
            details: format!("unexpected tmux output `{}`", output.stdout.trim()),
        })
    }

    async fn list_panes(&self, scope: &PaneScope) -> Result<Vec<PaneInfo>, ControllerError> {
        let target = match scope {
            PaneScope::Window(window) => window.to_string(),
            PaneScope::Session(session) => session.clone(),
        };
        let output = self
            .run("list_panes", &target, commands::list_panes(scope))
            .await?;
        Ok(parse_pane_list(&output.stdout))
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, ControllerError> {
        let output = self
            .run("list_windows", session, commands::list_windows(session))
            .await?;
        Ok(parse_window_list(&output.stdout))
    }

    async fn kill_pane(&self, pane: &PaneAddress) -> Result<(), ControllerError> {
        self.run(
            "kill",
            &pane.to_string(),
            commands::kill_pane(&pane.tmux_target()),
        )
        .await
        .map(|_| ())
    }

    async fn kill_session(&self, name: &str) -> Result<(), ControllerError> {
        self.run("cleanup", name, commands::kill_session(name))
            .await
            .map(|_| ())
    }

    async fn session_exists(&self, name: &str) -> Result<bool, ControllerError> {
        match self
            .run("session_exists", name, commands::has_session(name))
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.is_target_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn describe_pane(&self, target: &PaneTarget) -> Result<PaneInfo, ControllerError> {
        let label = target.to_string();
        let output = self
            .run(
                "resolve",
                &label,
                commands::describe_pane(&target.tmux_target()),
            )
            .await?;
        let info = self.parse_created("resolve", &label, output)?;
        // tmux falls back to the active pane for some partial targets; only an
        // exact match counts as the requested pane.
        if let PaneTarget::Address(address) = target {
            if &info.address != address {
                return Err(ControllerError::not_found(label, "resolve"));
            }
        }
        Ok(info)
    }

    async fn set_session_option(
        &self,
        session: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ControllerError> {
        self.run(
            "set_option",
            session,
            commands::set_session_option(session, key, value),
        )
        .await
        .map(|_| ())
    }

    async fn session_option(
        &self,
        session: &str,
        key: &str,
    ) -> Result<Option<String>, ControllerError> {
        let output = self
            .run(
                "show_option",
                session,
                commands::show_session_option(session, key),
            )
            .await?;
        let value = output.stdout.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    async fn attach(&self, session: &str) -> Result<(), ControllerError> {
        // Interactive: inherit the terminal instead of piping output.
        let args = commands::attach_session(session);
        tracing::debug!(command = %render_command_line(&self.binary, &args), "tmux attach");
        let status = tokio::process::Command::new(&self.binary)
            .args(&args)
            .status()
            .await
            .map_err(|e| ControllerError::MultiplexerUnavailable(format!("{}: {e}", self.binary)))?;
        if status.success() {
            Ok(())
        } else {
            Err(ControllerError::CommandFailed {
                operation: "attach".to_string(),
                target: session.to_string(),
                details: format!("tmux attach exited with {}", status.code().unwrap_or(-1)),
            })
        }
    }
}
