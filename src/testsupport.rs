//! Shared test fixtures: a scripted in-memory multiplexer and a temp dir.
//!
//! `FakeMux` models sessions, windows, and panes with plain strings for pane
//! contents, so delivery, idle, execution, and controller logic can be tested
//! without a tmux server. Pair it with `#[tokio::test(start_paused = true)]`
//! to make polling deterministic.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::address::{PaneAddress, PaneTarget};
use crate::error::ControllerError;
use crate::tmux::{
    CaptureRange, CaptureSnapshot, CursorPosition, Key, Multiplexer, PaneInfo, PaneScope,
    WindowInfo,
};

/// Rows on every fake screen.
const SCREEN_ROWS: usize = 24;

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!(
            "tmuxctl-{prefix}-{}-{millis}-{suffix}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Mutating calls recorded by [`FakeMux`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    CreateSession(String),
    CreateWindow(String),
    CreatePane(PaneAddress),
    Text(PaneAddress, String),
    Key(PaneAddress, Key),
    Capture(PaneAddress),
    KillPane(PaneAddress),
    KillSession(String),
    SetOption(String, String, String),
    Attach(String),
}

#[derive(Debug, Clone)]
enum ShellReply {
    Finish { output: String, exit_code: i32 },
    /// Output appears at once; the end marker only after `captures` more captures.
    FinishLater {
        output: String,
        exit_code: i32,
        captures: u32,
    },
    Hang { output: String },
}

/// What the emulated shell prints now, and what it prints after some captures.
#[derive(Debug, Clone)]
struct ShellOutput {
    now: String,
    later: Option<(u32, String)>,
}

/// Canned replies for commands wrapped by the sentinel protocol.
#[derive(Debug, Clone, Default)]
pub struct ShellScript {
    replies: Vec<(String, ShellReply)>,
}

impl ShellScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// `command` prints `output` and exits with `exit_code`.
    pub fn on(mut self, command: &str, output: &str, exit_code: i32) -> Self {
        self.replies.push((
            command.to_string(),
            ShellReply::Finish {
                output: output.to_string(),
                exit_code,
            },
        ));
        self
    }

    /// `command` prints `output` at once, then finishes with `exit_code`
    /// once the pane has been captured `captures` more times.
    pub fn finish_after(
        mut self,
        command: &str,
        output: &str,
        exit_code: i32,
        captures: u32,
    ) -> Self {
        self.replies.push((
            command.to_string(),
            ShellReply::FinishLater {
                output: output.to_string(),
                exit_code,
                captures,
            },
        ));
        self
    }

    /// `command` prints `output` and never finishes.
    pub fn hang(mut self, command: &str, output: &str) -> Self {
        self.replies.push((
            command.to_string(),
            ShellReply::Hang {
                output: output.to_string(),
            },
        ));
        self
    }

    /// Text the emulated shell prints after a submitted line.
    fn respond(&self, line: &str) -> ShellOutput {
        let Some((id, command)) = parse_wrapped_line(line) else {
            return ShellOutput {
                now: "$ \n".to_string(),
                later: None,
            };
        };
        let reply = self
            .replies
            .iter()
            .find(|(known, _)| *known == command)
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| ShellReply::Finish {
                output: format!("sh: {command}: not found\n"),
                exit_code: 127,
            });
        let end = |exit_code: i32| format!("__TMUXCTL_END_{id}:{exit_code}\n$ \n");
        match reply {
            ShellReply::Finish { output, exit_code } => ShellOutput {
                now: format!("__TMUXCTL_BEGIN_{id}\n{output}{}", end(exit_code)),
                later: None,
            },
            ShellReply::FinishLater {
                output,
                exit_code,
                captures,
            } => ShellOutput {
                now: format!("__TMUXCTL_BEGIN_{id}\n{output}"),
                later: Some((captures, end(exit_code))),
            },
            ShellReply::Hang { output } => ShellOutput {
                now: format!("__TMUXCTL_BEGIN_{id}\n{output}"),
                later: None,
            },
        }
    }
}

/// Extract `(token id, command)` from a line typed by the executor.
fn parse_wrapped_line(line: &str) -> Option<(String, String)> {
    let after_begin = line.split_once("__TMUXCTL_BEGIN ")?.1;
    let id = after_begin.split_once(';')?.0.trim().to_string();
    let after_eval = line.split_once("( eval ")?.1;
    let quoted = after_eval.rsplit_once(" ); printf")?.0;
    let command = match quoted.strip_prefix('\'').and_then(|q| q.strip_suffix('\'')) {
        Some(inner) => inner.replace("'\\''", "'"),
        None => quoted.to_string(),
    };
    Some((id, command))
}

#[derive(Debug, Clone)]
struct FakePane {
    id: String,
    active: bool,
    command: String,
    screen: String,
    /// Typed but not yet submitted.
    pending: String,
    ignore_enters: u32,
    fail_captures: u32,
    /// Remaining captures that see fresh output.
    stream: u32,
    ticks: u64,
    shell: Option<ShellScript>,
    /// Captures left before `text` is printed.
    deferred: Option<(u32, String)>,
}

impl FakePane {
    fn new(id: String, command: &str) -> Self {
        Self {
            id,
            active: false,
            command: command.to_string(),
            screen: String::new(),
            pending: String::new(),
            ignore_enters: 0,
            fail_captures: 0,
            stream: 0,
            ticks: 0,
            shell: None,
            deferred: None,
        }
    }

    fn contents(&self) -> String {
        format!("{}{}", self.screen, self.pending)
    }

    /// The last screenful of rows. The final row is the cursor row.
    fn rows(&self) -> Vec<String> {
        let contents = self.contents();
        let rows: Vec<&str> = contents.split('\n').collect();
        let start = rows.len().saturating_sub(SCREEN_ROWS);
        rows[start..].iter().map(|row| row.to_string()).collect()
    }

    /// Visible rows padded with blank lines, the way tmux prints a screen.
    fn visible(&self) -> String {
        let mut rows = self.rows();
        rows.resize(SCREEN_ROWS, String::new());
        rows.iter().map(|row| format!("{row}\n")).collect()
    }

    fn cursor(&self) -> CursorPosition {
        let rows = self.rows();
        let last = rows.last().map_or(0, |row| row.chars().count());
        CursorPosition {
            x: u32::try_from(last).unwrap_or(u32::MAX),
            y: u32::try_from(rows.len().saturating_sub(1)).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    panes: BTreeMap<PaneAddress, FakePane>,
    options: HashMap<(String, String), String>,
    active_window: HashMap<String, u32>,
    next_id: u32,
    calls: Vec<FakeCall>,
}

impl FakeState {
    fn insert_pane(&mut self, address: PaneAddress, command: &str, active: bool) -> PaneInfo {
        let id = format!("%{}", self.next_id);
        self.next_id += 1;
        let mut pane = FakePane::new(id, command);
        pane.active = active;
        self.panes.insert(address.clone(), pane);
        self.info(&address).expect("pane was just inserted")
    }

    fn info(&self, address: &PaneAddress) -> Option<PaneInfo> {
        self.panes.get(address).map(|pane| PaneInfo {
            address: address.clone(),
            id: pane.id.clone(),
            active: pane.active,
            width: 80,
            height: 24,
            command: pane.command.clone(),
        })
    }

    fn session_exists(&self, name: &str) -> bool {
        self.panes.keys().any(|address| address.session == name)
    }

    fn pane_mut(
        &mut self,
        address: &PaneAddress,
        operation: &str,
    ) -> Result<&mut FakePane, ControllerError> {
        self.panes
            .get_mut(address)
            .ok_or_else(|| ControllerError::not_found(address.to_string(), operation))
    }
}

/// Scripted in-memory [`Multiplexer`].
#[derive(Debug, Default)]
pub struct FakeMux {
    state: Mutex<FakeState>,
}

impl FakeMux {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add an unmanaged session with `panes` panes in window `window`.
    pub fn add_session(&self, name: &str, window: u32, panes: u32) {
        let mut state = self.state();
        for pane in 0..panes {
            state.insert_pane(PaneAddress::new(name, window, pane), "sh", pane == 0);
        }
        state.active_window.insert(name.to_string(), window);
    }

    pub fn pane_id(&self, address: &PaneAddress) -> Option<String> {
        self.state().panes.get(address).map(|pane| pane.id.clone())
    }

    pub fn has_pane(&self, address: &PaneAddress) -> bool {
        self.state().panes.contains_key(address)
    }

    pub fn has_session(&self, name: &str) -> bool {
        self.state().session_exists(name)
    }

    pub fn set_screen(&self, address: &PaneAddress, text: &str) {
        if let Some(pane) = self.state().panes.get_mut(address) {
            pane.screen = text.to_string();
        }
    }

    /// Current pane contents including unsubmitted input.
    pub fn screen(&self, address: &PaneAddress) -> String {
        self.state()
            .panes
            .get(address)
            .map(FakePane::contents)
            .unwrap_or_default()
    }

    /// Swallow the next `count` Enter presses without changing the screen.
    pub fn ignore_enters(&self, address: &PaneAddress, count: u32) {
        if let Some(pane) = self.state().panes.get_mut(address) {
            pane.ignore_enters = count;
        }
    }

    /// Fail the next `count` captures with a transient error.
    pub fn fail_next_captures(&self, address: &PaneAddress, count: u32) {
        if let Some(pane) = self.state().panes.get_mut(address) {
            pane.fail_captures = count;
        }
    }

    /// Every capture sees a new line of output.
    pub fn stream_output(&self, address: &PaneAddress) {
        self.stream_output_for(address, u32::MAX);
    }

    /// The next `captures` captures each see a new line of output.
    pub fn stream_output_for(&self, address: &PaneAddress, captures: u32) {
        if let Some(pane) = self.state().panes.get_mut(address) {
            pane.stream = captures;
        }
    }

    /// Answer submitted sentinel-wrapped lines from `script`.
    pub fn emulate_shell(&self, address: &PaneAddress, script: ShellScript) {
        if let Some(pane) = self.state().panes.get_mut(address) {
            pane.shell = Some(script);
        }
    }

    pub fn set_option(&self, session: &str, key: &str, value: &str) {
        self.state()
            .options
            .insert((session.to_string(), key.to_string()), value.to_string());
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl Multiplexer for FakeMux {
    async fn create_session(
        &self,
        name: &str,
        command: Option<&str>,
    ) -> Result<PaneInfo, ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::CreateSession(name.to_string()));
        if state.session_exists(name) {
            return Err(ControllerError::CommandFailed {
                operation: "create_session".into(),
                target: name.into(),
                details: format!("duplicate session: {name}"),
            });
        }
        state.active_window.insert(name.to_string(), 0);
        Ok(state.insert_pane(PaneAddress::new(name, 0, 0), command.unwrap_or("sh"), true))
    }

    async fn create_window(
        &self,
        session: &str,
        command: Option<&str>,
    ) -> Result<PaneInfo, ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::CreateWindow(session.to_string()));
        let window = state
            .panes
            .keys()
            .filter(|address| address.session == session)
            .map(|address| address.window)
            .max()
            .ok_or_else(|| ControllerError::not_found(session, "create_window"))?
            + 1;
        Ok(state.insert_pane(
            PaneAddress::new(session, window, 0),
            command.unwrap_or("sh"),
            true,
        ))
    }

    async fn create_pane(
        &self,
        beside: &PaneAddress,
        command: Option<&str>,
        _vertical: bool,
    ) -> Result<PaneInfo, ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::CreatePane(beside.clone()));
        if !state.panes.contains_key(beside) {
            return Err(ControllerError::not_found(beside.to_string(), "create_pane"));
        }
        let pane = state
            .panes
            .keys()
            .filter(|address| address.window_scope() == beside.window_scope())
            .map(|address| address.pane)
            .max()
            .unwrap_or(0)
            + 1;
        Ok(state.insert_pane(
            PaneAddress::new(beside.session.clone(), beside.window, pane),
            command.unwrap_or("sh"),
            false,
        ))
    }

    async fn send_text(&self, pane: &PaneAddress, text: &str) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::Text(pane.clone(), text.to_string()));
        state.pane_mut(pane, "send")?.pending.push_str(text);
        Ok(())
    }

    async fn send_key(&self, pane: &PaneAddress, key: Key) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::Key(pane.clone(), key));
        let target = state.pane_mut(pane, "send_key")?;
        match key {
            Key::Enter if target.ignore_enters > 0 => target.ignore_enters -= 1,
            Key::Enter => {
                let line = std::mem::take(&mut target.pending);
                target.screen.push_str(&line);
                target.screen.push('\n');
                if let Some(shell) = &target.shell {
                    let reply = shell.respond(&line);
                    target.screen.push_str(&reply.now);
                    target.deferred = reply.later;
                }
            }
            Key::Interrupt => {
                target.pending.clear();
                target.screen.push_str("^C\n$ \n");
            }
            Key::Escape => {}
        }
        Ok(())
    }

    async fn capture_text(
        &self,
        pane: &PaneAddress,
        range: CaptureRange,
    ) -> Result<CaptureSnapshot, ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::Capture(pane.clone()));
        let target = state.pane_mut(pane, "capture")?;
        if target.fail_captures > 0 {
            target.fail_captures -= 1;
            return Err(ControllerError::CommandFailed {
                operation: "capture".into(),
                target: pane.to_string(),
                details: "server busy".into(),
            });
        }
        if target.stream > 0 {
            target.stream -= 1;
            target.ticks += 1;
            let line = format!("tick {}\n", target.ticks);
            target.screen.push_str(&line);
        }
        if let Some((remaining, text)) = target.deferred.take() {
            if remaining <= 1 {
                target.screen.push_str(&text);
            } else {
                target.deferred = Some((remaining - 1, text));
            }
        }
        let text = match range {
            CaptureRange::History => target.contents(),
            CaptureRange::Visible => target.visible(),
        };
        Ok(CaptureSnapshot::new(pane.clone(), text))
    }

    async fn cursor_position(&self, pane: &PaneAddress) -> Result<CursorPosition, ControllerError> {
        let mut state = self.state();
        Ok(state.pane_mut(pane, "cursor")?.cursor())
    }

    async fn list_panes(&self, scope: &PaneScope) -> Result<Vec<PaneInfo>, ControllerError> {
        let state = self.state();
        let (label, panes): (String, Vec<PaneInfo>) = match scope {
            PaneScope::Window(window) => (
                window.to_string(),
                state
                    .panes
                    .keys()
                    .filter(|address| address.window_scope() == *window)
                    .filter_map(|address| state.info(address))
                    .collect(),
            ),
            PaneScope::Session(session) => (
                session.clone(),
                state
                    .panes
                    .keys()
                    .filter(|address| address.session == *session)
                    .filter_map(|address| state.info(address))
                    .collect(),
            ),
        };
        if panes.is_empty() {
            return Err(ControllerError::not_found(label, "list_panes"));
        }
        Ok(panes)
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, ControllerError> {
        let state = self.state();
        let mut windows: BTreeMap<u32, u32> = BTreeMap::new();
        for address in state.panes.keys().filter(|a| a.session == session) {
            *windows.entry(address.window).or_default() += 1;
        }
        if windows.is_empty() {
            return Err(ControllerError::not_found(session, "list_windows"));
        }
        let active = state.active_window.get(session).copied();
        Ok(windows
            .into_iter()
            .map(|(index, panes)| WindowInfo {
                session: session.to_string(),
                index,
                name: format!("win{index}"),
                panes,
                active: active == Some(index),
            })
            .collect())
    }

    async fn kill_pane(&self, pane: &PaneAddress) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::KillPane(pane.clone()));
        state
            .panes
            .remove(pane)
            .map(|_| ())
            .ok_or_else(|| ControllerError::not_found(pane.to_string(), "kill"))
    }

    async fn kill_session(&self, name: &str) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::KillSession(name.to_string()));
        if !state.session_exists(name) {
            return Err(ControllerError::not_found(name, "cleanup"));
        }
        state.panes.retain(|address, _| address.session != name);
        state.options.retain(|(session, _), _| session != name);
        state.active_window.remove(name);
        Ok(())
    }

    async fn session_exists(&self, name: &str) -> Result<bool, ControllerError> {
        Ok(self.state().session_exists(name))
    }

    async fn describe_pane(&self, target: &PaneTarget) -> Result<PaneInfo, ControllerError> {
        let state = self.state();
        let found = match target {
            PaneTarget::Address(address) => state.info(address),
            PaneTarget::Id(id) => state
                .panes
                .iter()
                .find(|(_, pane)| pane.id == *id)
                .and_then(|(address, _)| state.info(address)),
        };
        found.ok_or_else(|| ControllerError::not_found(target.to_string(), "resolve"))
    }

    async fn set_session_option(
        &self,
        session: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::SetOption(
            session.to_string(),
            key.to_string(),
            value.to_string(),
        ));
        if !state.session_exists(session) {
            return Err(ControllerError::not_found(session, "set_option"));
        }
        state
            .options
            .insert((session.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn session_option(
        &self,
        session: &str,
        key: &str,
    ) -> Result<Option<String>, ControllerError> {
        let state = self.state();
        if !state.session_exists(session) {
            return Err(ControllerError::not_found(session, "show_option"));
        }
        Ok(state
            .options
            .get(&(session.to_string(), key.to_string()))
            .cloned())
    }

    async fn attach(&self, session: &str) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.calls.push(FakeCall::Attach(session.to_string()));
        if !state.session_exists(session) {
            return Err(ControllerError::not_found(session, "attach"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let dir = TestTempDir::new("fixture");
        let path = dir.write_text("nested/file.txt", "hello");
        assert_eq!(path, dir.child("nested/file.txt"));
        assert!(path.starts_with(dir.path()));
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
    }

    #[test]
    fn wrapped_lines_are_parsed_back() {
        let protocol = crate::protocol::SentinelProtocol::new(
            crate::protocol::SentinelToken::from_id("t1"),
        );
        let line = protocol.wrap("echo 'it''s'");
        assert_eq!(
            parse_wrapped_line(&line),
            Some(("t1".to_string(), "echo 'it''s'".to_string()))
        );
        assert_eq!(parse_wrapped_line("ls -la"), None);
    }

    #[tokio::test]
    async fn visible_capture_keeps_blank_rows_and_tracks_the_cursor() {
        let mux = FakeMux::new();
        mux.add_session("s", 0, 1);
        let pane = PaneAddress::new("s", 0, 0);
        mux.set_screen(&pane, "$ ");
        mux.send_text(&pane, "ls").await.unwrap();
        let before = mux.capture_text(&pane, CaptureRange::Visible).await.unwrap();
        assert_eq!(before.text.lines().count(), SCREEN_ROWS);
        assert_eq!(
            mux.cursor_position(&pane).await.unwrap(),
            CursorPosition { x: 4, y: 0 }
        );

        mux.send_key(&pane, Key::Enter).await.unwrap();
        let after = mux.capture_text(&pane, CaptureRange::Visible).await.unwrap();
        assert_eq!(after.text, before.text);
        assert_eq!(
            mux.cursor_position(&pane).await.unwrap(),
            CursorPosition { x: 0, y: 1 }
        );
    }

    #[tokio::test]
    async fn fake_panes_get_stable_ids_and_vanish_when_killed() {
        let mux = FakeMux::new();
        mux.add_session("s", 0, 2);
        let second = PaneAddress::new("s", 0, 1);
        let id = mux.pane_id(&second).unwrap();
        let info = mux.describe_pane(&PaneTarget::Id(id)).await.unwrap();
        assert_eq!(info.address, second);
        mux.kill_pane(&second).await.unwrap();
        assert!(!mux.has_pane(&second));
        assert!(mux.kill_pane(&second).await.unwrap_err().is_target_not_found());
    }
}
