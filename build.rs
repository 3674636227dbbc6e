//! Stamps the commit and build time into `TMUXCTL_BUILD_*` for `--version`.
//!
//! Either value can be pinned through the environment variable of the same
//! name, which reproducible packaging builds rely on.

use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const COMMIT_VAR: &str = "TMUXCTL_BUILD_GIT_HASH";
const TIME_VAR: &str = "TMUXCTL_BUILD_TIMESTAMP";

fn main() {
    watch_git_head();
    for (var, detect) in [(COMMIT_VAR, commit as fn() -> String), (TIME_VAR, build_time)] {
        println!("cargo:rerun-if-env-changed={var}");
        let value = std::env::var(var).unwrap_or_else(|_| detect());
        println!("cargo:rustc-env={var}={value}");
    }
}

/// Rebuild when HEAD moves, including new commits on the checked-out branch.
fn watch_git_head() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    let branch = std::fs::read_to_string(".git/HEAD")
        .ok()
        .and_then(|head| head.trim().strip_prefix("ref: ").map(str::to_owned));
    if let Some(branch) = branch {
        println!("cargo:rerun-if-changed=.git/{branch}");
    }
}

fn commit() -> String {
    stdout_of("git", &["rev-parse", "--short=12", "HEAD"]).unwrap_or_else(|| "unknown".into())
}

/// UTC timestamp from `date`, or epoch seconds where `date` is missing.
fn build_time() -> String {
    stdout_of("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"]).unwrap_or_else(|| {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        format!("unix:{secs}")
    })
}

fn stdout_of(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
