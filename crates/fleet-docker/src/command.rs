//! Running docker subcommands and capturing their output.

use std::process::Command;

use tracing::debug;

/// Captured result of a finished command.
pub(crate) struct Finished {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Render a command line for logs and error messages.
pub(crate) fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run `cmd` to completion. `Err` only when it could not be spawned.
pub(crate) fn run(cmd: &mut Command) -> Result<Finished, String> {
    debug!("Running: {}", describe(cmd));
    let output = cmd.output().map_err(|e| e.to_string())?;
    Ok(Finished {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Non-empty trimmed lines of command output.
pub(crate) fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
