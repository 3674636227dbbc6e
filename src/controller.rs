//! Controller façade: the operation surface used by the CLI and library
//! callers.
//!
//! Every operation resolves its target first, runs the safety guard for
//! destructive requests, then delegates to the adapter and the delivery, idle,
//! and execution layers.

use serde::Serialize;
use tokio::time::Duration;

use crate::address::{self, PaneAddress, PaneContext, PaneTarget, WindowScope};
use crate::config::Config;
use crate::delivery::{send_verified, DeliveryOptions, DeliveryReport};
use crate::error::ControllerError;
use crate::executor::{self, ExecuteOptions, ExecutionResult};
use crate::guard::{ensure_not_self_pane, ensure_not_self_session};
use crate::idle::{self, IdleReport};
use crate::session::{probe_session, unix_now, ManagedSession, Mode, SessionProbe, SessionState};
use crate::tmux::{CaptureRange, CaptureSnapshot, Key, Multiplexer, PaneInfo, PaneScope, WindowInfo};

/// Process environment that decides local vs remote mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `$TMUX`; set when running inside a tmux client.
    pub tmux: Option<String>,
    /// `$TMUX_PANE`; the caller's own pane id.
    pub tmux_pane: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            tmux: read("TMUX"),
            tmux_pane: read("TMUX_PANE"),
        }
    }

    pub fn inside_tmux(&self) -> bool {
        self.tmux.is_some()
    }
}

/// Per-call overrides for `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    pub press_enter: bool,
    pub enter_delay: Option<Duration>,
    pub verify: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            press_enter: true,
            enter_delay: None,
            verify: true,
        }
    }
}

/// Capture shaping for `capture`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureOptions {
    /// Keep only the last N non-blank-padded lines.
    pub lines: Option<usize>,
    pub history: bool,
}

/// Snapshot of where the controller is and what it can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub mode: &'static str,
    /// Caller's own pane (local mode).
    pub location: Option<PaneAddress>,
    /// Managed session (remote mode).
    pub session: Option<ManagedSession>,
    pub panes: Vec<PaneInfo>,
}

/// Terminal automation controller over a [`Multiplexer`].
#[derive(Debug)]
pub struct Controller<M> {
    mux: M,
    config: Config,
    mode: Mode,
    session: ManagedSession,
    /// A session with the managed name exists but lacks our marker.
    foreign_session: bool,
}

impl<M: Multiplexer> Controller<M> {
    /// Build a controller with an explicit mode, without touching tmux.
    pub fn new(mux: M, config: Config, mode: Mode) -> Self {
        let session = ManagedSession::new(config.tmux.session_name.clone());
        Self {
            mux,
            config,
            mode,
            session,
            foreign_session: false,
        }
    }

    /// Detect the mode from `env` and load any existing managed session.
    pub async fn connect(mux: M, config: Config, env: &Environment) -> Result<Self, ControllerError> {
        let mode = if env.inside_tmux() {
            let pane_id = env.tmux_pane.as_deref().ok_or_else(|| {
                ControllerError::MultiplexerUnavailable(
                    "TMUX is set but TMUX_PANE is missing; cannot determine own pane".into(),
                )
            })?;
            let own = mux
                .describe_pane(&PaneTarget::Id(pane_id.to_string()))
                .await?
                .address;
            Mode::Local { own }
        } else {
            Mode::Remote
        };
        tracing::debug!(mode = mode.name(), "controller mode");

        let mut controller = Self::new(mux, config, mode);
        if controller.mode == Mode::Remote {
            controller.reload_session().await?;
        }
        Ok(controller)
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn session(&self) -> &ManagedSession {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn multiplexer(&self) -> &M {
        &self.mux
    }

    /// Sync the in-memory session with what tmux currently holds.
    async fn reload_session(&mut self) -> Result<(), ControllerError> {
        if self.session.state == SessionState::Destroyed {
            return Ok(());
        }
        match probe_session(&self.mux, &self.session.name).await? {
            SessionProbe::Absent => {
                self.session = ManagedSession::new(self.session.name.clone());
                self.foreign_session = false;
            }
            SessionProbe::Managed { created_at, owner } => {
                self.session = ManagedSession::adopt(self.session.name.clone(), created_at, owner);
                self.foreign_session = false;
            }
            SessionProbe::Unmanaged => {
                self.session = ManagedSession::new(self.session.name.clone());
                self.foreign_session = true;
            }
        }
        Ok(())
    }

    /// Create the managed session if needed; returns its first pane when created.
    async fn ensure_session(
        &mut self,
        command: Option<&str>,
    ) -> Result<Option<PaneInfo>, ControllerError> {
        self.session.ensure_usable()?;
        if self.foreign_session {
            return Err(ControllerError::NotManaged {
                session: self.session.name.clone(),
            });
        }
        if self.session.state == SessionState::Active
            && self.mux.session_exists(&self.session.name).await?
        {
            return Ok(None);
        }

        let pane = self.mux.create_session(&self.session.name, command).await?;
        self.session.activate(unix_now())?;
        self.session.write_markers(&self.mux).await?;
        Ok(Some(pane))
    }

    /// Context that bare pane indexes expand against.
    async fn context(&self) -> Result<Option<PaneContext>, ControllerError> {
        match &self.mode {
            Mode::Local { own } => Ok(Some(PaneContext::from(own))),
            Mode::Remote => {
                if self.session.state != SessionState::Active {
                    return Ok(None);
                }
                let windows = self.mux.list_windows(&self.session.name).await?;
                let window = windows
                    .iter()
                    .find(|window| window.active)
                    .or_else(|| windows.first())
                    .map(|window| window.index);
                Ok(window.map(|window| PaneContext::new(self.session.name.clone(), window)))
            }
        }
    }

    async fn resolve(&self, raw: &str, operation: &str) -> Result<PaneAddress, ControllerError> {
        self.session.ensure_usable()?;
        let context = self.context().await?;
        address::resolve(&self.mux, raw, context.as_ref(), operation).await
    }

    fn shell_command(&self, command: Option<&str>) -> String {
        command
            .map(str::trim)
            .filter(|command| !command.is_empty())
            .unwrap_or(&self.config.tmux.shell)
            .to_string()
    }

    /// Start `command` (or the configured shell) in a new pane.
    pub async fn launch(
        &mut self,
        command: Option<&str>,
        vertical: bool,
    ) -> Result<PaneAddress, ControllerError> {
        let command = self.shell_command(command);
        let pane = match &self.mode {
            Mode::Local { own } => {
                self.mux
                    .create_pane(own, Some(&command), vertical)
                    .await?
            }
            Mode::Remote => match self.ensure_session(Some(&command)).await? {
                Some(created) => created,
                None => {
                    self.mux
                        .create_window(&self.session.name, Some(&command))
                        .await?
                }
            },
        };
        tracing::info!(pane = %pane.address, %command, "launched");
        Ok(pane.address)
    }

    /// Type `text` into a pane, pressing and verifying Enter unless disabled.
    pub async fn send(
        &self,
        raw: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<DeliveryReport, ControllerError> {
        let pane = self.resolve(raw, "send").await?;
        let mut delivery = DeliveryOptions::from_timing(&self.config.timing);
        delivery.press_enter = options.press_enter;
        delivery.verify = options.verify;
        if let Some(delay) = options.enter_delay {
            delivery.enter_delay = delay;
        }
        send_verified(&self.mux, &pane, text, &delivery, "send").await
    }

    /// Read pane text without side effects.
    pub async fn capture(
        &self,
        raw: &str,
        options: CaptureOptions,
    ) -> Result<CaptureSnapshot, ControllerError> {
        let pane = self.resolve(raw, "capture").await?;
        let range = if options.history {
            CaptureRange::History
        } else {
            CaptureRange::Visible
        };
        let mut snapshot = self.mux.capture_text(&pane, range).await?;
        if let Some(lines) = options.lines {
            snapshot.text = snapshot.tail_lines(lines);
        }
        Ok(snapshot)
    }

    /// Panes in `scope` (`session:window`), or the default scope for the mode.
    pub async fn list_panes(&self, scope: Option<&str>) -> Result<Vec<PaneInfo>, ControllerError> {
        self.session.ensure_usable()?;
        let scope = match (scope, &self.mode) {
            (Some(raw), _) => PaneScope::Window(WindowScope::parse(raw)?),
            (None, Mode::Local { own }) => PaneScope::Window(own.window_scope()),
            (None, Mode::Remote) => {
                if self.session.state != SessionState::Active {
                    return Ok(Vec::new());
                }
                PaneScope::Session(self.session.name.clone())
            }
        };
        self.mux.list_panes(&scope).await
    }

    pub async fn status(&self) -> Result<StatusReport, ControllerError> {
        let panes = self.list_panes(None).await?;
        Ok(match &self.mode {
            Mode::Local { own } => StatusReport {
                mode: self.mode.name(),
                location: Some(own.clone()),
                session: None,
                panes,
            },
            Mode::Remote => StatusReport {
                mode: self.mode.name(),
                location: None,
                session: Some(self.session.clone()),
                panes,
            },
        })
    }

    /// Kill a pane; never the caller's own.
    pub async fn kill(&self, raw: &str) -> Result<PaneAddress, ControllerError> {
        let pane = self.resolve(raw, "kill").await?;
        ensure_not_self_pane(self.mode.own_pane(), &pane, "kill")?;
        self.mux.kill_pane(&pane).await?;
        tracing::info!(%pane, "killed pane");
        Ok(pane)
    }

    /// Send Ctrl-C.
    pub async fn interrupt(&self, raw: &str) -> Result<PaneAddress, ControllerError> {
        let pane = self.resolve(raw, "interrupt").await?;
        self.mux.send_key(&pane, Key::Interrupt).await?;
        Ok(pane)
    }

    pub async fn escape(&self, raw: &str) -> Result<PaneAddress, ControllerError> {
        let pane = self.resolve(raw, "escape").await?;
        self.mux.send_key(&pane, Key::Escape).await?;
        Ok(pane)
    }

    /// Defaults come from `[timing]` when `None`.
    pub async fn wait_idle(
        &self,
        raw: &str,
        idle_time: Option<Duration>,
        timeout: Option<Duration>,
    ) -> Result<IdleReport, ControllerError> {
        let pane = self.resolve(raw, "wait_idle").await?;
        let timing = &self.config.timing;
        idle::wait_idle(
            &self.mux,
            &pane,
            idle_time.unwrap_or_else(|| timing.idle_time()),
            timeout.unwrap_or_else(|| timing.wait_timeout()),
            timing,
        )
        .await
    }

    /// Run `command` in a pane's shell and recover its exit code.
    ///
    /// In remote mode the managed session is created on first use.
    pub async fn execute(
        &mut self,
        raw: &str,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult, ControllerError> {
        if self.mode == Mode::Remote && self.session.state != SessionState::Active {
            let shell = self.shell_command(None);
            self.ensure_session(Some(&shell)).await?;
        }
        let pane = self.resolve(raw, "execute").await?;
        let timeout = timeout.unwrap_or_else(|| self.config.timing.execute_timeout());
        let options = ExecuteOptions::from_timing(&self.config.timing, timeout);
        executor::execute(&self.mux, &pane, command, &options).await
    }

    /// Attach the terminal to the managed session.
    pub async fn attach(&self) -> Result<(), ControllerError> {
        if !matches!(self.mode, Mode::Remote) {
            return Err(ControllerError::mode_not_supported("attach"));
        }
        self.session.ensure_active("attach")?;
        self.mux.attach(&self.session.name).await
    }

    /// Destroy the managed session. Terminal for this controller.
    pub async fn cleanup(&mut self) -> Result<String, ControllerError> {
        let name = self.session.name.clone();
        ensure_not_self_session(self.mode.own_session(), &name, "cleanup")?;
        if !matches!(self.mode, Mode::Remote) {
            return Err(ControllerError::mode_not_supported("cleanup"));
        }
        self.session.ensure_usable()?;
        match probe_session(&self.mux, &name).await? {
            SessionProbe::Absent => return Err(ControllerError::not_found(name, "cleanup")),
            SessionProbe::Unmanaged => return Err(ControllerError::NotManaged { session: name }),
            SessionProbe::Managed { .. } => {}
        }
        self.mux.kill_session(&name).await?;
        self.session.destroy();
        Ok(name)
    }

    pub async fn list_windows(&self) -> Result<Vec<WindowInfo>, ControllerError> {
        if !matches!(self.mode, Mode::Remote) {
            return Err(ControllerError::mode_not_supported("list_windows"));
        }
        self.session.ensure_active("list_windows")?;
        self.mux.list_windows(&self.session.name).await
    }
}
