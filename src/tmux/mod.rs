//! tmux integration: process helpers, argv builders, record parsers, and the
//! `Multiplexer` adapter.

mod adapter;
pub(crate) mod commands;
pub(crate) mod panes;
pub(crate) mod process;

pub use adapter::{Multiplexer, TmuxAdapter};
pub use commands::Key;
pub use panes::{CaptureRange, CaptureSnapshot, CursorPosition, PaneInfo, PaneScope, WindowInfo};
pub use process::format_duration;
