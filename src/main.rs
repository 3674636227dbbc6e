//! CLI entry point for tmuxctl.

mod cli;

use clap::Parser;
use serde_json::json;
use std::io::IsTerminal;

use tmuxctl::config::{
    apply_session_override, initialize_default_global_config, load_config, GlobalConfigInitResult,
};
use tmuxctl::controller::{CaptureOptions, Controller, Environment, SendOptions, StatusReport};
use tmuxctl::error::ControllerError;
use tmuxctl::render::{error_json, pane_line, to_json, window_line, Renderer};
use tmuxctl::tmux::{format_duration, TmuxAdapter};

use cli::Command;

/// Exit status for `execute` runs that hit their timeout.
const EXIT_TIMED_OUT: i32 = 124;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.verbose))
        .with_writer(std::io::stderr)
        .init();

    let renderer = Renderer::new(!args.no_color && std::io::stderr().is_terminal());
    let code = match run(&args, &renderer).await {
        Ok(code) => code,
        Err(err) => {
            if args.json {
                println!("{}", error_json(&err));
            } else {
                renderer.error(&err.to_string());
            }
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

/// `TMUXCTL_LOG` wins; otherwise `-v` raises the default `warn` level.
fn log_filter(verbose: u8) -> tracing_subscriber::EnvFilter {
    let level = match std::env::var("TMUXCTL_LOG") {
        Ok(v) if !v.trim().is_empty() => v,
        _ if verbose > 0 => "tmuxctl=debug".to_string(),
        _ => "warn".to_string(),
    };
    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

fn exit_code_for(err: &ControllerError) -> i32 {
    match err {
        ControllerError::InvalidAddress { .. } => 2,
        ControllerError::TargetNotFound { .. } => 3,
        ControllerError::DeliveryFailed { .. } => 4,
        ControllerError::SelfTargetRefused { .. } => 5,
        ControllerError::ModeNotSupported { .. } => 6,
        _ => 1,
    }
}

async fn run(args: &cli::Args, renderer: &Renderer) -> Result<i32, ControllerError> {
    if let Command::Init { force } = &args.command {
        run_init(renderer, *force)?;
        return Ok(0);
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(session) = &args.session {
        apply_session_override(&mut config, session)?;
    }
    let mux = TmuxAdapter::connect(config.tmux.binary.clone()).await?;
    let mut controller = Controller::connect(mux, config, &Environment::from_process()).await?;

    match &args.command {
        Command::Launch { command, vertical } => {
            let pane = controller.launch(command.as_deref(), *vertical).await?;
            if args.json {
                println!("{}", to_json(&json!({ "pane": pane })));
            } else {
                println!("{pane}");
            }
        }
        Command::Send {
            target,
            text,
            no_enter,
            no_verify,
            delay,
        } => {
            let options = SendOptions {
                press_enter: !no_enter,
                enter_delay: *delay,
                verify: !no_verify,
            };
            let report = controller.send(target, text, options).await?;
            if args.json {
                println!("{}", to_json(&report));
            }
        }
        Command::Capture {
            target,
            lines,
            history,
        } => {
            let options = CaptureOptions {
                lines: *lines,
                history: *history,
            };
            let snapshot = controller.capture(target, options).await?;
            if args.json {
                println!(
                    "{}",
                    to_json(&json!({
                        "pane": snapshot.pane,
                        "text": snapshot.text,
                        "timestamp_ms": snapshot.timestamp_millis(),
                    }))
                );
            } else {
                print_block(&snapshot.text);
            }
        }
        Command::ListPanes { scope } => {
            let panes = controller.list_panes(scope.as_deref()).await?;
            if args.json {
                println!("{}", to_json(&panes));
            } else {
                for pane in &panes {
                    println!("{}", pane_line(pane));
                }
            }
        }
        Command::Status => {
            let status = controller.status().await?;
            if args.json {
                println!("{}", to_json(&status));
            } else {
                render_status(renderer, &status);
            }
        }
        Command::Kill { target } => {
            let pane = controller.kill(target).await?;
            print_pane_result(args.json, &pane.to_string());
        }
        Command::Interrupt { target } => {
            let pane = controller.interrupt(target).await?;
            print_pane_result(args.json, &pane.to_string());
        }
        Command::Escape { target } => {
            let pane = controller.escape(target).await?;
            print_pane_result(args.json, &pane.to_string());
        }
        Command::WaitIdle {
            target,
            idle,
            timeout,
        } => {
            let report = controller.wait_idle(target, *idle, *timeout).await?;
            if args.json {
                println!("{}", to_json(&report));
            } else if !report.became_idle {
                renderer.warn(&format!(
                    "`{target}` still changing after {}",
                    format_duration(report.elapsed)
                ));
            }
            if !report.became_idle {
                return Ok(1);
            }
        }
        Command::Execute {
            target,
            command,
            timeout,
        } => {
            let result = controller.execute(target, command, *timeout).await?;
            if args.json {
                println!("{}", to_json(&result));
            } else {
                print_block(&result.output);
                if result.timed_out() {
                    renderer.warn("command timed out; it may still be running in the pane");
                }
            }
            if result.timed_out() {
                return Ok(EXIT_TIMED_OUT);
            }
            return Ok(result.exit_code.clamp(0, 255));
        }
        Command::Attach => controller.attach().await?,
        Command::Cleanup => {
            let session = controller.cleanup().await?;
            if args.json {
                println!("{}", to_json(&json!({ "removed": session })));
            } else {
                renderer.section("removed managed session");
                renderer.field("session", &session);
            }
        }
        Command::ListWindows => {
            let windows = controller.list_windows().await?;
            if args.json {
                println!("{}", to_json(&windows));
            } else {
                for window in &windows {
                    println!("{}", window_line(window));
                }
            }
        }
        Command::Init { .. } => {}
    }
    Ok(0)
}

fn run_init(renderer: &Renderer, force: bool) -> Result<(), ControllerError> {
    match initialize_default_global_config(force)? {
        GlobalConfigInitResult::Created { path } => {
            renderer.section("initialized tmuxctl config");
            renderer.field("path", &path.display().to_string());
        }
        GlobalConfigInitResult::Overwritten { path, backup_path } => {
            renderer.section("rewrote tmuxctl config");
            renderer.field("path", &path.display().to_string());
            renderer.field("backup", &backup_path.display().to_string());
        }
        GlobalConfigInitResult::AlreadyInitialized { path } => {
            renderer.section("tmuxctl config already initialized");
            renderer.field("path", &path.display().to_string());
            renderer.detail("use `tmuxctl init --force` to overwrite");
        }
    }
    Ok(())
}

fn render_status(renderer: &Renderer, status: &StatusReport) {
    renderer.section("tmuxctl");
    renderer.field("mode", status.mode);
    if let Some(location) = &status.location {
        renderer.field("location", &location.to_string());
    }
    if let Some(session) = &status.session {
        renderer.field("session", &session.name);
        renderer.field("state", &format!("{:?}", session.state).to_lowercase());
        renderer.field("owner", &session.owner);
    }
    renderer.field("panes", &status.panes.len().to_string());
    for pane in &status.panes {
        renderer.detail(&pane_line(pane));
    }
}

fn print_pane_result(json: bool, pane: &str) {
    if json {
        println!("{}", to_json(&json!({ "pane": pane })));
    }
}

/// Print captured text, ending with exactly one newline when non-empty.
fn print_block(text: &str) {
    if text.is_empty() {
        return;
    }
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}
