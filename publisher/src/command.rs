//! External command execution.
//!
//! The publisher shells out to `git` and `jfrog-cli`. Both go through the
//! [`CommandExecutor`] seam so the workflow can be exercised without
//! spawning real processes.

use crate::error::{PublishError, Result};
use log::{debug, info};
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ziti_ci_publisher::command::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("git", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), ziti_ci_publisher::error::PublishError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(PublishError::from)
    }
}

/// Runs a command and fails unless it exits successfully.
///
/// `description` names the step for logs and error messages. Arguments are
/// not logged because they may carry the repository credential.
///
/// # Errors
///
/// Returns [`PublishError::CommandFailed`] on a non-zero exit, or the
/// executor's error if the process could not be started.
pub fn run_checked(
    executor: &dyn CommandExecutor,
    description: &str,
    cmd: &str,
    args: &[&str],
) -> Result<Output> {
    info!("{description}");
    let output = executor.run(cmd, args)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PublishError::CommandFailed {
            description: description.to_owned(),
            status: output.status,
            stderr: stderr.trim().to_owned(),
        });
    }

    debug!("{description}: {cmd} exited with {}", output.status);
    Ok(output)
}

/// Runs a command and returns its trimmed standard output.
///
/// # Errors
///
/// Same as [`run_checked`]. Non-UTF-8 output is converted lossily.
pub fn capture_stdout(
    executor: &dyn CommandExecutor,
    description: &str,
    cmd: &str,
    args: &[&str],
) -> Result<String> {
    let output = run_checked(executor, description, cmd, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, output_with_stdout};

    #[test]
    fn run_checked_returns_output_on_success() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "git",
            args: vec!["status"],
            result: Ok(output_with_stdout("clean\n")),
        }]);

        let output = run_checked(&executor, "Check status", "git", &["status"])
            .expect("command should succeed");
        assert_eq!(output.stdout, b"clean\n");
        executor.assert_finished();
    }

    #[test]
    fn run_checked_reports_stderr_on_failure() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "jfrog-cli",
            args: vec!["rt", "ping"],
            result: Ok(failure_output("  connection refused \n")),
        }]);

        let err = run_checked(&executor, "Ping Artifactory", "jfrog-cli", &["rt", "ping"])
            .expect_err("command should fail");
        match err {
            PublishError::CommandFailed {
                description,
                stderr,
                ..
            } => {
                assert_eq!(description, "Ping Artifactory");
                assert_eq!(stderr, "connection refused");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn capture_stdout_trims_output() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "git",
            args: vec!["rev-parse", "--abbrev-ref", "HEAD"],
            result: Ok(output_with_stdout("main\n")),
        }]);

        let branch = capture_stdout(
            &executor,
            "Read branch",
            "git",
            &["rev-parse", "--abbrev-ref", "HEAD"],
        )
        .expect("command should succeed");
        assert_eq!(branch, "main");
    }
}
