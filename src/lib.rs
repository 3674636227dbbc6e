//! tmuxctl: drive tmux panes from programs.
//!
//! The controller launches processes in panes, types text with verified
//! Enter delivery, captures output, waits for output to go quiet, and runs
//! shell commands with their exit status recovered from the screen.
//!
//! # Quick start
//!
//! ```no_run
//! use tmuxctl::config::load_config;
//! use tmuxctl::controller::{Controller, Environment};
//! use tmuxctl::tmux::TmuxAdapter;
//!
//! # async fn example() -> Result<(), tmuxctl::error::ControllerError> {
//! let config = load_config(None)?;
//! let mux = TmuxAdapter::connect(config.tmux.binary.clone()).await?;
//! let mut controller = Controller::connect(mux, config, &Environment::from_process()).await?;
//! let pane = controller.launch(None, false).await?;
//! let result = controller.execute(&pane.to_string(), "ls", None).await?;
//! println!("{} (exit {})", result.output, result.exit_code);
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod build_info;
pub mod config;
pub mod controller;
pub mod delivery;
pub mod error;
pub mod executor;
pub mod guard;
pub mod idle;
pub mod poll;
pub mod protocol;
pub mod render;
pub mod session;
#[cfg(test)]
pub mod testsupport;
pub mod tmux;
