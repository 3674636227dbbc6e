//! Sentinel protocol: recover output boundaries and exit status from a
//! screen-only channel.
//!
//! A command is wrapped so the shell prints a begin marker, runs the command
//! in a subshell, then prints an end marker carrying `$?`:
//!
//! ```text
//! printf '%s_%s\n' __TMUXCTL_BEGIN <id>; ( eval '<command>' ); printf '%s_%s:%s\n' __TMUXCTL_END <id> "$?"
//! ```
//!
//! The marker text is assembled by `printf`, so the typed (echoed) command
//! line never contains `__TMUXCTL_END_<id>` and cannot be mistaken for
//! completion. `eval` in a subshell keeps `exit N` and trailing comments from
//! affecting the pane's own shell.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::tmux::process::shell_quote;

const BEGIN_TAG: &str = "__TMUXCTL_BEGIN";
const END_TAG: &str = "__TMUXCTL_END";

static TOKEN_SEQ: AtomicU64 = AtomicU64::new(0);

/// Per-call marker id; never reused within a process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SentinelToken(String);

impl SentinelToken {
    /// pid + monotonic counter + random suffix.
    pub fn generate() -> Self {
        let seq = TOKEN_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "{:x}x{:x}x{:08x}",
            std::process::id(),
            seq,
            rand::random::<u32>()
        ))
    }

    /// Build from a fixed id (tests and replays).
    pub fn from_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn begin_marker(&self) -> String {
        format!("{BEGIN_TAG}_{}", self.0)
    }

    /// End marker prefix; the exit status follows it.
    pub fn end_marker(&self) -> String {
        format!("{END_TAG}_{}:", self.0)
    }
}

/// Output and exit status parsed from a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub output: String,
    pub exit_code: i32,
}

/// Wraps commands and parses captures for one token.
#[derive(Debug, Clone)]
pub struct SentinelProtocol {
    token: SentinelToken,
}

impl SentinelProtocol {
    pub fn new(token: SentinelToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &SentinelToken {
        &self.token
    }

    /// The single line typed into the pane.
    pub fn wrap(&self, command: &str) -> String {
        let id = self.token.as_str();
        format!(
            "printf '%s_%s\\n' {BEGIN_TAG} {id}; ( eval {} ); printf '%s_%s:%s\\n' {END_TAG} {id} \"$?\"",
            shell_quote(command)
        )
    }

    /// Parse a capture; `None` until the end marker is visible.
    pub fn find_completion(&self, capture: &str) -> Option<Completion> {
        let end_marker = self.token.end_marker();
        let lines: Vec<&str> = capture.lines().collect();
        let (end_idx, marker_col) = lines
            .iter()
            .enumerate()
            .find_map(|(idx, line)| line.find(&end_marker).map(|col| (idx, col)))?;

        let line = lines[end_idx];
        let status: String = line[marker_col + end_marker.len()..]
            .chars()
            .take_while(|ch| ch.is_ascii_digit())
            .collect();
        let exit_code = status.parse::<i32>().ok()?;

        let start = self.output_start(&lines[..end_idx]);
        let mut output = join_lines(&lines[start..end_idx]);
        // Output without a trailing newline shares the marker's line.
        output.push_str(&line[..marker_col]);
        Some(Completion { output, exit_code })
    }

    /// Whatever the command printed so far, for timed-out runs.
    pub fn partial_output(&self, capture: &str) -> String {
        let lines: Vec<&str> = capture.lines().collect();
        let start = self.output_start(&lines);
        let end = lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(start, |idx| (idx + 1).max(start));
        join_lines(&lines[start..end])
    }

    /// Index of the first output line: after the begin marker, else after
    /// the echoed command line, else the top of the capture.
    fn output_start(&self, lines: &[&str]) -> usize {
        let begin_marker = self.token.begin_marker();
        if let Some(idx) = lines.iter().rposition(|line| line.trim() == begin_marker) {
            return idx + 1;
        }
        let echoed = format!("{BEGIN_TAG} {}", self.token.as_str());
        lines
            .iter()
            .rposition(|line| line.contains(&echoed))
            .map_or(0, |idx| idx + 1)
    }
}

fn join_lines(lines: &[&str]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}
