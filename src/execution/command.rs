//! Child Process Helpers
//!
//! Small wrappers around `std::process::Command` shared by the wrapper and
//! the analysis runner: rendering a command for logs and error messages,
//! running with captured output, and running with resource sampling while
//! the child's stdio streams straight into the job log.

use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use log::{debug, error, info};

use crate::error::{Error, Result};
use crate::monitoring::ResourceMonitor;

/// Interval between resource samples while waiting on a child.
const MONITOR_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Renders a command as a single loggable string.
pub fn render(cmd: &Command) -> String {
    let mut text = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        text.push(' ');
        text.push_str(&arg.to_string_lossy());
    }
    text
}

/// Runs a command to completion with captured output.
///
/// A non-zero exit logs the child's stderr and returns
/// [`Error::CommandFailed`] carrying the rendered command line.
pub fn run_checked(cmd: &mut Command) -> Result<Output> {
    let rendered = render(cmd);
    debug!("Running: {}", rendered);

    let output = cmd.output().map_err(|e| Error::Spawn {
        command: rendered.clone(),
        source: e,
    })?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(
            "Command `{}` failed with exit code: {:?}",
            rendered,
            output.status.code()
        );
        if !stderr.trim().is_empty() {
            error!("stderr:\n{}", stderr);
        }

        Err(Error::CommandFailed {
            command: rendered,
            code: output.status.code(),
        })
    }
}

/// Runs a command with inherited stdio and waits for it.
///
/// Used for long-running analysis subprocesses whose progress output
/// belongs in the job log as it happens.
pub fn run_streamed(cmd: &mut Command) -> Result<()> {
    let rendered = render(cmd);
    info!("Running: {}", rendered);

    let status = cmd.status().map_err(|e| Error::Spawn {
        command: rendered.clone(),
        source: e,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            command: rendered,
            code: status.code(),
        })
    }
}

/// Runs a command with inherited stdio, sampling its resource usage until
/// it exits.
///
/// The child's stdout/stderr flow into the job's own log stream, which is
/// what the platform expects from long-running analysis tools. Returns the
/// populated monitor on success; a non-zero exit is an error.
pub fn run_monitored(cmd: &mut Command) -> Result<ResourceMonitor> {
    let rendered = render(cmd);
    info!("Running: {}", rendered);

    let mut child = cmd.spawn().map_err(|e| Error::Spawn {
        command: rendered.clone(),
        source: e,
    })?;

    let mut monitor = ResourceMonitor::for_child(child.id());

    loop {
        match child.try_wait()? {
            Some(status) => {
                if status.success() {
                    debug!("Command `{}` completed successfully", rendered);
                    return Ok(monitor);
                }
                return Err(Error::CommandFailed {
                    command: rendered,
                    code: status.code(),
                });
            }
            None => {
                monitor.sample();
                thread::sleep(MONITOR_SAMPLE_INTERVAL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_program_only() {
        let cmd = Command::new("p3-ls");
        assert_eq!(render(&cmd), "p3-ls");
    }

    #[test]
    fn test_render_with_args() {
        let mut cmd = Command::new("p3-cp");
        cmd.arg("-r").arg("-f").arg("stage").arg("ws:/dest");
        assert_eq!(render(&cmd), "p3-cp -r -f stage ws:/dest");
    }

    #[test]
    fn test_run_checked_success() {
        let mut cmd = Command::new("true");
        assert!(run_checked(&mut cmd).is_ok());
    }

    #[test]
    fn test_run_checked_failure_carries_command() {
        let mut cmd = Command::new("false");
        let err = run_checked(&mut cmd).unwrap_err();

        match err {
            Error::CommandFailed { command, code } => {
                assert_eq!(command, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_run_checked_missing_program() {
        let mut cmd = Command::new("definitely-not-a-real-program-42");
        let err = run_checked(&mut cmd).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[test]
    fn test_run_streamed_success() {
        let mut cmd = Command::new("true");
        assert!(run_streamed(&mut cmd).is_ok());
    }

    #[test]
    fn test_run_streamed_failure() {
        let mut cmd = Command::new("false");
        let err = run_streamed(&mut cmd).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: Some(1), .. }));
    }

    #[test]
    fn test_run_monitored_success() {
        let mut cmd = Command::new("sleep");
        cmd.arg("0.1");
        assert!(run_monitored(&mut cmd).is_ok());
    }

    #[test]
    fn test_run_monitored_failure() {
        let mut cmd = Command::new("false");
        let err = run_monitored(&mut cmd).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
