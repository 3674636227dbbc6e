//! Terminal output for the CLI.
//!
//! Status chatter goes to stderr through [`Renderer`]; command results go to
//! stdout, either as plain text or as one JSON document per invocation.

use crossterm::style::{Color, Stylize};
use serde::Serialize;
use serde_json::json;

use crate::error::ControllerError;
use crate::tmux::{PaneInfo, WindowInfo};

const INDENT: &str = "  ";
const LABEL_WARNING: &str = "warning:";
const LABEL_ERROR: &str = "error:";
const SECTION_BULLET: &str = "•";

/// Styled stderr output.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn error(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_ERROR.with(Color::Red).bold());
        } else {
            eprintln!("{LABEL_ERROR} {msg}");
        }
    }

    pub fn warn(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_WARNING.with(Color::Yellow).bold());
        } else {
            eprintln!("{LABEL_WARNING} {msg}");
        }
    }

    /// Small section header in status-style output.
    pub fn section(&self, title: &str) {
        if self.color {
            eprintln!(
                "{} {}",
                SECTION_BULLET.with(Color::DarkGrey),
                title.with(Color::White).bold()
            );
        } else {
            eprintln!("{title}:");
        }
    }

    pub fn field(&self, key: &str, value: &str) {
        if self.color {
            eprintln!(
                "{INDENT}{} {}",
                format!("{key}:").with(Color::DarkGrey),
                value.with(Color::Cyan)
            );
        } else {
            eprintln!("{INDENT}{key}: {value}");
        }
    }

    pub fn detail(&self, text: &str) {
        if self.color {
            eprintln!("{INDENT}{}", text.with(Color::Grey));
        } else {
            eprintln!("{INDENT}{text}");
        }
    }
}

/// One pane per line: `address  id  WxH  command  [active]`.
pub fn pane_line(pane: &PaneInfo) -> String {
    let mut line = format!(
        "{}\t{}\t{}x{}\t{}",
        pane.address, pane.id, pane.width, pane.height, pane.command
    );
    if pane.active {
        line.push_str("\tactive");
    }
    line
}

pub fn window_line(window: &WindowInfo) -> String {
    let mut line = format!(
        "{}:{}\t{}\t{} panes",
        window.session, window.index, window.name, window.panes
    );
    if window.active {
        line.push_str("\tactive");
    }
    line
}

/// Pretty JSON for `--json` output.
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| {
        json!({ "error": { "kind": "serialize", "message": err.to_string() } }).to_string()
    })
}

/// Machine-readable error document.
pub fn error_json(err: &ControllerError) -> String {
    to_json(&json!({
        "error": {
            "kind": err.kind(),
            "message": err.to_string(),
        }
    }))
}
