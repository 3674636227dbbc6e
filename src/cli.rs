//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};
use std::time::Duration;

use tmuxctl::build_info;

/// Drive tmux panes from scripts: launch, type, read, wait, and run commands.
#[derive(Debug, Parser)]
#[command(
    name = "tmuxctl",
    version,
    long_version = build_info::LONG_VERSION,
    after_help = build_info::HELP_BUILD_METADATA
)]
pub struct Args {
    /// Path to config file (default: ./tmuxctl.toml or ~/.config/tmuxctl/tmuxctl.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Managed session name used outside tmux.
    #[arg(short = 's', long = "session", global = true)]
    pub session: Option<String>,

    /// Print results as JSON on stdout.
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Log controller activity to stderr (repeat for more).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable color output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a command (default: your shell) in a new pane.
    Launch {
        /// Command line to run in the new pane.
        command: Option<String>,
        /// Split top/bottom instead of side by side.
        #[arg(long = "vertical")]
        vertical: bool,
    },
    /// Type text into a pane and press Enter.
    Send {
        target: String,
        text: String,
        /// Type the text without pressing Enter.
        #[arg(long = "no-enter")]
        no_enter: bool,
        /// Press Enter once without checking that it registered.
        #[arg(long = "no-verify")]
        no_verify: bool,
        /// Pause between typing and Enter (e.g. 500ms, 2s).
        #[arg(long = "delay", value_parser = parse_duration_arg)]
        delay: Option<Duration>,
    },
    /// Print pane contents.
    Capture {
        target: String,
        /// Keep only the last N lines.
        #[arg(short = 'n', long = "lines")]
        lines: Option<usize>,
        /// Include scrollback history.
        #[arg(long = "history")]
        history: bool,
    },
    /// List panes of a window (`session:window`) or the default scope.
    ListPanes { scope: Option<String> },
    /// Show mode, location, and panes.
    Status,
    /// Kill a pane (never your own).
    Kill { target: String },
    /// Send Ctrl-C to a pane.
    Interrupt { target: String },
    /// Send Escape to a pane.
    Escape { target: String },
    /// Wait until a pane's output stops changing.
    WaitIdle {
        target: String,
        /// Quiet period that counts as idle (default from config).
        #[arg(long = "idle", value_parser = parse_duration_arg)]
        idle: Option<Duration>,
        #[arg(long = "timeout", value_parser = parse_duration_arg)]
        timeout: Option<Duration>,
    },
    /// Run a shell command in a pane and exit with its status.
    Execute {
        target: String,
        command: String,
        #[arg(long = "timeout", value_parser = parse_duration_arg)]
        timeout: Option<Duration>,
    },
    /// Attach this terminal to the managed session.
    Attach,
    /// Kill the managed session.
    Cleanup,
    /// List windows of the managed session.
    ListWindows,
    /// Write the default config to ~/.config/tmuxctl/tmuxctl.toml.
    Init {
        /// Overwrite an existing config, keeping a timestamped backup.
        #[arg(long = "force")]
        force: bool,
    },
}

/// Parse `500ms`, `30s`, `2m`, `1h`, or bare seconds. Fractions such as
/// `1.5` or `0.25s` are accepted.
pub fn parse_duration_arg(input: &str) -> Result<Duration, String> {
    let s = input.trim().to_ascii_lowercase();
    let (digits, unit) = if let Some(digits) = s.strip_suffix("ms") {
        (digits, "ms")
    } else if s.ends_with(|ch: char| ch.is_ascii_alphabetic()) {
        s.split_at(s.len() - 1)
    } else {
        (s.as_str(), "s")
    };
    let value = digits
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid duration `{input}` (try 500ms, 1.5s, 2m)"))?;
    let seconds = match unit {
        "ms" => value / 1000.0,
        "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        _ => return Err(format!("unknown duration unit in `{input}`")),
    };
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("duration `{input}` must be a non-negative finite value"))
}
