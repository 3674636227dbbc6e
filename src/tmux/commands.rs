//! Pure builders for tmux argument vectors.
//!
//! Keeping argv construction separate from process spawning lets the exact
//! command lines be asserted in unit tests without a tmux server.

use super::panes::{CaptureRange, PaneScope, CURSOR_FORMAT, PANE_FORMAT, WINDOW_FORMAT};

/// Named keys sent with `send-keys` (not literal text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    /// Ctrl-C.
    Interrupt,
    Escape,
}

impl Key {
    pub fn tmux_name(self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Interrupt => "C-c",
            Self::Escape => "Escape",
        }
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

/// Literal text injection; `--` keeps text starting with `-` from being
/// parsed as a flag.
pub(crate) fn send_literal(target: &str, text: &str) -> Vec<String> {
    args(&["send-keys", "-l", "-t", target, "--", text])
}

pub(crate) fn send_key(target: &str, key: Key) -> Vec<String> {
    args(&["send-keys", "-t", target, key.tmux_name()])
}

/// `capture-pane` printing to stdout with wrapped lines joined.
pub(crate) fn capture(target: &str, range: CaptureRange) -> Vec<String> {
    let mut out = args(&["capture-pane", "-p", "-J"]);
    if range == CaptureRange::History {
        out.extend(args(&["-S", "-", "-E", "-"]));
    }
    out.extend(args(&["-t", target]));
    out
}

pub(crate) fn list_panes(scope: &PaneScope) -> Vec<String> {
    match scope {
        PaneScope::Window(window) => {
            args(&["list-panes", "-t", &window.tmux_target(), "-F", PANE_FORMAT])
        }
        PaneScope::Session(session) => args(&[
            "list-panes",
            "-s",
            "-t",
            &exact_session(session),
            "-F",
            PANE_FORMAT,
        ]),
    }
}

pub(crate) fn list_windows(session: &str) -> Vec<String> {
    args(&["list-windows", "-t", &exact_session(session), "-F", WINDOW_FORMAT])
}

/// Detached session whose first pane is printed in `PANE_FORMAT`.
pub(crate) fn new_session(name: &str, command: Option<&str>) -> Vec<String> {
    let mut out = args(&["new-session", "-d", "-s", name, "-P", "-F", PANE_FORMAT]);
    out.extend(command.map(str::to_string));
    out
}

/// New window appended to `session`.
pub(crate) fn new_window(session: &str, command: Option<&str>) -> Vec<String> {
    // Trailing ':' asks tmux for the next free window index.
    let target = format!("{}:", exact_session(session));
    let mut out = args(&["new-window", "-d", "-t", &target, "-P", "-F", PANE_FORMAT]);
    out.extend(command.map(str::to_string));
    out
}

/// Split the window containing `target`; `vertical` stacks panes top/bottom.
pub(crate) fn split_window(target: &str, vertical: bool, command: Option<&str>) -> Vec<String> {
    let direction = if vertical { "-v" } else { "-h" };
    let mut out = args(&[
        "split-window",
        "-d",
        direction,
        "-t",
        target,
        "-P",
        "-F",
        PANE_FORMAT,
    ]);
    out.extend(command.map(str::to_string));
    out
}

pub(crate) fn kill_pane(target: &str) -> Vec<String> {
    args(&["kill-pane", "-t", target])
}

pub(crate) fn kill_session(name: &str) -> Vec<String> {
    args(&["kill-session", "-t", &exact_session(name)])
}

pub(crate) fn has_session(name: &str) -> Vec<String> {
    args(&["has-session", "-t", &exact_session(name)])
}

/// Print `PANE_FORMAT` for one pane; fails when the pane does not exist.
pub(crate) fn describe_pane(target: &str) -> Vec<String> {
    args(&["display-message", "-p", "-t", target, PANE_FORMAT])
}

pub(crate) fn cursor_position(target: &str) -> Vec<String> {
    args(&["display-message", "-p", "-t", target, CURSOR_FORMAT])
}

pub(crate) fn set_session_option(session: &str, key: &str, value: &str) -> Vec<String> {
    args(&["set-option", "-t", &exact_session(session), key, value])
}

/// `-q` keeps unset user options from being reported as errors.
pub(crate) fn show_session_option(session: &str, key: &str) -> Vec<String> {
    args(&["show-options", "-q", "-v", "-t", &exact_session(session), key])
}

pub(crate) fn attach_session(name: &str) -> Vec<String> {
    args(&["attach-session", "-t", &exact_session(name)])
}

fn exact_session(name: &str) -> String {
    format!("={name}")
}
