//! `ziti-ci` entrypoint.
//!
//! Packages the release tree and publishes it to Artifactory. Progress is
//! reported through `log`; the final error, if any, is written to stderr.

use clap::Parser;
use std::io::Write;
use ziti_ci_publisher::cli::{Cli, Command, PublishArgs};
use ziti_ci_publisher::command::SystemCommandExecutor;
use ziti_ci_publisher::error::Result;
use ziti_ci_publisher::publish::run_publish;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs the logger; `RUST_LOG` takes precedence over `-v`/`-q`.
fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Command::PublishToArtifactory(args) => publish(args, cli.quiet, stderr),
    }
}

fn publish(args: &PublishArgs, quiet: bool, stderr: &mut dyn Write) -> Result<()> {
    let request = args.to_request()?;
    let plan = run_publish(&request, &SystemCommandExecutor, &env_lookup)?;

    if !quiet {
        let verb = if request.dry_run { "Planned" } else { "Published" };
        let extra = usize::from(plan.aggregate.is_some());
        write_stderr_line(
            stderr,
            format!("{verb} {} upload(s).", plan.uploads.len() + extra),
        );
    }
    Ok(())
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ziti_ci_publisher::error::PublishError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = PublishError::MissingCredential {
            variable: "JFROG_API_KEY".to_owned(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert_eq!(stderr_text, "JFROG_API_KEY not specified\n");
    }

    #[test]
    fn env_lookup_reads_process_environment() {
        temp_env::with_vars(
            [("ZITI_CI_TEST_VAR", Some("set")), ("ZITI_CI_UNSET_VAR", None)],
            || {
                assert_eq!(env_lookup("ZITI_CI_TEST_VAR").as_deref(), Some("set"));
                assert!(env_lookup("ZITI_CI_UNSET_VAR").is_none());
            },
        );
    }
}
