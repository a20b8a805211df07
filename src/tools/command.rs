//! Running external tools and turning failures into [`ArchiveError::ExternalTool`].

use log::debug;
use std::process::{Command, ExitStatus, Output};

use crate::error::{ArchiveError, ArchiveResult};

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

/// Captured stdout and stderr of a finished process, trimmed.
pub fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stderr);
    }
    text
}

pub fn tool_error(tool: &str, status: &ExitStatus, output: String) -> ArchiveError {
    ArchiveError::ExternalTool {
        tool: tool.to_string(),
        status: status.to_string(),
        output,
    }
}

pub fn spawn_error(tool: &str, err: std::io::Error) -> ArchiveError {
    ArchiveError::ExternalTool {
        tool: tool.to_string(),
        status: "could not be started".to_string(),
        output: err.to_string(),
    }
}

/// Run `cmd` to completion. A non-zero exit becomes an error carrying the captured output.
pub fn run_tool(cmd: &mut Command) -> ArchiveResult<Output> {
    let tool = program_name(cmd);
    debug!("Running {cmd:?}");
    let output = cmd.output().map_err(|e| spawn_error(&tool, e))?;
    if !output.status.success() {
        return Err(tool_error(&tool, &output.status, combined_output(&output)));
    }
    Ok(output)
}

/// Like [`run_tool`] but returns stdout as text.
pub fn run_tool_stdout(cmd: &mut Command) -> ArchiveResult<String> {
    let output = run_tool(cmd)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn failing_tool_reports_output() {
        let err = run_tool(Command::new("sh").args(["-c", "echo boom >&2; exit 4"])).unwrap_err();
        match err {
            ArchiveError::ExternalTool { tool, output, .. } => {
                assert_eq!(tool, "sh");
                assert_eq!(output, "boom");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_tool_is_an_error() {
        let err = run_tool(&mut Command::new("definitely-not-an-installed-tool")).unwrap_err();
        assert!(matches!(err, ArchiveError::ExternalTool { .. }));
    }

    #[test]
    fn stdout_is_returned() {
        let out = run_tool_stdout(Command::new("sh").args(["-c", "printf hello"])).unwrap();
        assert_eq!(out, "hello");
    }
}
