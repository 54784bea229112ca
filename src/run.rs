//! Typed results for external process invocations. Every external-call
//! wrapper in the workflow returns one of these; the orchestrator decides the
//! per-step failure policy explicitly.

use std::path::Path;
use std::process::Command;

/// Captured outcome of an external command.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The last line of diagnostic output, for one-line narration.
    pub fn last_diagnostic_line(&self) -> &str {
        self.stderr
            .lines()
            .last()
            .or_else(|| self.stdout.lines().last())
            .unwrap_or("No output available")
    }
}

impl From<std::process::Output> for RunOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Run a command with captured output, optionally from a working directory.
pub fn run_captured<S: AsRef<std::ffi::OsStr>>(
    program: S,
    args: &[String],
    cwd: Option<&Path>,
) -> Result<RunOutput, std::io::Error> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command.output()?;
    Ok(RunOutput::from(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_output() {
        let result = run_captured(
            "sh",
            &["-c".to_string(), "echo out; echo err >&2; exit 7".to_string()],
            None,
        )
        .unwrap();
        assert_eq!(result.exit_code, 7);
        assert!(!result.success());
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.last_diagnostic_line(), "err");
    }

    #[test]
    fn spawn_failure_surfaces_as_io_error() {
        let result = run_captured("definitely-not-a-real-program-xyz", &[], None);
        assert!(result.is_err());
    }
}
