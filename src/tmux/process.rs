//! Child-process helpers for invoking the tmux binary.

use std::process::Stdio;
use tokio::process::Command;
use tokio::time::Duration;

use crate::error::ControllerError;

/// Captured result of one tmux invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExecOutput {
    pub(crate) exit_code: i32,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

/// Spawn and wait for a process.
pub(crate) async fn run_process(
    program: &str,
    args: &[String],
) -> Result<ExecOutput, ControllerError> {
    let mut cmd = Command::new(program);
    // The CLI may exit on an error while a child is still running.
    cmd.kill_on_drop(true);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = cmd.output().await.map_err(|e| spawn_error(program, e))?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

fn spawn_error(program: &str, err: std::io::Error) -> ControllerError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ControllerError::MultiplexerUnavailable(format!("`{program}` was not found in PATH"))
    } else {
        ControllerError::MultiplexerUnavailable(format!("{program}: {err}"))
    }
}

/// Convert a non-zero exit into a contextual error.
///
/// Missing targets are classified separately so callers can tell a vanished
/// pane from a genuine tmux failure.
pub(crate) fn ensure_success(
    output: ExecOutput,
    operation: &str,
    target: &str,
) -> Result<ExecOutput, ControllerError> {
    if output.exit_code == 0 {
        return Ok(output);
    }

    let mut details = if output.stderr.trim().is_empty() {
        output.stdout.trim().to_string()
    } else {
        output.stderr.trim().to_string()
    };
    if details.is_empty() {
        details = format!("tmux exited with {}", output.exit_code);
    }

    Err(classify_failure(operation, target, details))
}

pub(crate) fn classify_failure(operation: &str, target: &str, details: String) -> ControllerError {
    if is_missing_target_message(&details) {
        return ControllerError::not_found(target, operation);
    }
    ControllerError::CommandFailed {
        operation: operation.to_string(),
        target: target.to_string(),
        details,
    }
}

/// Whether tmux stderr says the target (or the whole server) is gone.
pub(crate) fn is_missing_target_message(details: &str) -> bool {
    let lower = details.to_ascii_lowercase();
    [
        "can't find",
        "no such",
        "session not found",
        "window not found",
        "pane not found",
        "no server running",
        "error connecting to",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
}

/// Run `<binary> -V` and return the reported version string.
pub(crate) async fn probe_version(binary: &str) -> Result<String, ControllerError> {
    let output = run_process(binary, &["-V".to_string()]).await?;
    if output.exit_code != 0 {
        return Err(ControllerError::MultiplexerUnavailable(format!(
            "`{binary} -V` exited with {}: {}",
            output.exit_code,
            output.stderr.trim()
        )));
    }
    Ok(output.stdout.trim().to_string())
}

/// Human-oriented duration formatting used in messages.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    if secs == 0 {
        return format!("{millis}ms");
    }
    if millis == 0 {
        if secs % 3600 == 0 {
            return format!("{}h", secs / 3600);
        }
        if secs % 60 == 0 {
            return format!("{}m", secs / 60);
        }
        return format!("{secs}s");
    }
    format!("{secs}.{millis:03}s")
}

/// Shell-safe single-quote escaping.
pub(crate) fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        "''".into()
    } else if s.bytes().all(|b| {
        b.is_ascii_alphanumeric()
            || matches!(b, b'-' | b'_' | b'.' | b'/' | b'%' | b'=' | b':' | b'@')
    }) {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Render an argv the way a user would type it, for logs and errors.
pub(crate) fn render_command_line(program: &str, args: &[String]) -> String {
    std::iter::once(shell_quote(program))
        .chain(args.iter().map(|arg| shell_quote(arg)))
        .collect::<Vec<_>>()
        .join(" ")
}
