//! Helpers for running window-manager command-line tools.

use super::WmError;
use log::debug;
use std::process::{Command, Stdio};

/// Run `program` and fail on a non-zero exit status.
pub fn run(program: &str, args: &[&str]) -> Result<(), WmError> {
    debug!("exec {} {}", program, args.join(" "));
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| WmError(format!("failed to run {}: {}", program, e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(WmError(format!(
            "{} {} exited with {}",
            program,
            args.join(" "),
            status
        )))
    }
}

/// Run `program` and return its standard output.
pub fn output(program: &str, args: &[&str]) -> Result<String, WmError> {
    debug!("query {} {}", program, args.join(" "));
    let out = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| WmError(format!("failed to run {}: {}", program, e)))?;
    if !out.status.success() {
        return Err(WmError(format!(
            "{} {} exited with {}",
            program,
            args.join(" "),
            out.status
        )));
    }
    String::from_utf8(out.stdout).map_err(|e| WmError(format!("utf-8: {}", e)))
}

/// Launch an application in the background through the shell.
///
/// The child is not waited for; it keeps running after tiletoggle exits.
pub fn spawn_detached(command: &str) -> Result<(), WmError> {
    debug!("launch {}", command);
    Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| WmError(format!("failed to start application {}: {}", command, e)))
}

/// X window ids whose title matches `name`, as reported by
/// `xdotool search --name`.
///
/// An empty list means no match; `xdotool` exits non-zero in that case.
pub fn xdotool_search(name: &str) -> Vec<String> {
    match output("xdotool", &["search", "--name", name]) {
        Ok(out) => split_ids(&out),
        Err(e) => {
            debug!("xdotool search {}: {}", name, e);
            Vec::new()
        }
    }
}

/// Split whitespace-separated id output into a list.
pub fn split_ids(out: &str) -> Vec<String> {
    out.split_whitespace().map(str::to_string).collect()
}
