use std::{
    path::Path,
    process::{Command, Stdio},
};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Execute a program to completion and capture stdout/stderr.
///
/// Stdin is closed; nothing here is interactive. The exit code is `-1` when
/// the process died to a signal.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or its output streams
/// cannot be collected.
pub fn run_command(program: &Path, args: &[String]) -> Result<RunOutput> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to start {}", program.display()))?;
    Ok(RunOutput {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
