//! Pane/window listing records and the tmux format strings that produce them.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::address::PaneAddress;

/// `-F` format for pane records; fields are tab separated.
pub(crate) const PANE_FORMAT: &str = "#{session_name}\t#{window_index}\t#{pane_index}\t#{pane_id}\t#{pane_active}\t#{pane_width}\t#{pane_height}\t#{pane_current_command}";
/// `-F` format for window records; fields are tab separated.
/// `display-message` format for the cursor cell.
pub(crate) const CURSOR_FORMAT: &str = "#{cursor_x},#{cursor_y}";

pub(crate) const WINDOW_FORMAT: &str =
    "#{session_name}\t#{window_index}\t#{window_name}\t#{window_panes}\t#{window_active}";

/// One pane as reported by `list-panes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaneInfo {
    pub address: PaneAddress,
    /// Stable tmux pane id (`%N`).
    pub id: String,
    pub active: bool,
    pub width: u16,
    pub height: u16,
    /// Foreground process name.
    pub command: String,
}

/// One window as reported by `list-windows`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowInfo {
    pub session: String,
    pub index: u32,
    pub name: String,
    pub panes: u32,
    pub active: bool,
}

/// Which panes `list_panes` should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneScope {
    Window(crate::address::WindowScope),
    Session(String),
}

/// How much of a pane to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureRange {
    /// Only the visible screen.
    #[default]
    Visible,
    /// Visible screen plus all scrollback.
    History,
}

/// Immutable pane contents at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSnapshot {
    pub pane: PaneAddress,
    pub text: String,
    pub timestamp: SystemTime,
}

impl CaptureSnapshot {
    pub fn new(pane: PaneAddress, text: String) -> Self {
        Self {
            pane,
            text,
            timestamp: SystemTime::now(),
        }
    }

    pub fn timestamp_millis(&self) -> u128 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }

    /// Last `n` lines, ignoring blank rows tmux pads the screen with.
    pub fn tail_lines(&self, n: usize) -> String {
        let lines: Vec<&str> = self.text.lines().collect();
        let end = lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(0, |idx| idx + 1);
        let start = end.saturating_sub(n);
        let mut out = lines[start..end].join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

pub(crate) fn parse_pane_line(line: &str) -> Option<PaneInfo> {
    let mut fields = line.splitn(8, '\t');
    let session = fields.next()?;
    let window = fields.next()?.trim().parse().ok()?;
    let pane = fields.next()?.trim().parse().ok()?;
    let id = fields.next()?.trim();
    let active = fields.next()?.trim() == "1";
    let width = fields.next()?.trim().parse().ok()?;
    let height = fields.next()?.trim().parse().ok()?;
    let command = fields.next().unwrap_or_default().trim();
    if session.is_empty() || !id.starts_with('%') {
        return None;
    }
    Some(PaneInfo {
        address: PaneAddress::new(session, window, pane),
        id: id.to_string(),
        active,
        width,
        height,
        command: command.to_string(),
    })
}

/// Cursor cell within the visible screen, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub x: u32,
    pub y: u32,
}

pub(crate) fn parse_cursor(output: &str) -> Option<CursorPosition> {
    let (x, y) = output.trim().split_once(',')?;
    Some(CursorPosition {
        x: x.trim().parse().ok()?,
        y: y.trim().parse().ok()?,
    })
}

/// Parse `list-panes -F PANE_FORMAT` output, skipping malformed rows.
pub(crate) fn parse_pane_list(output: &str) -> Vec<PaneInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_pane_line)
        .collect()
}

pub(crate) fn parse_window_line(line: &str) -> Option<WindowInfo> {
    let mut fields = line.splitn(5, '\t');
    let session = fields.next()?;
    let index = fields.next()?.trim().parse().ok()?;
    let name = fields.next()?;
    let panes = fields.next()?.trim().parse().ok()?;
    let active = fields.next()?.trim() == "1";
    Some(WindowInfo {
        session: session.to_string(),
        index,
        name: name.to_string(),
        panes,
        active,
    })
}

pub(crate) fn parse_window_list(output: &str) -> Vec<WindowInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_window_line)
        .collect()
}
