//! CLI argument definitions for `ziti-ci`.
//!
//! Kept apart from the binary so argument parsing and request assembly can
//! be unit tested.

use crate::config::{DEFAULT_CONFIG_FILE, PublishConfig};
use crate::error::Result;
use crate::publish::PublishRequest;
use crate::version::ContextOverrides;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

/// Release automation for Ziti builds.
#[derive(Parser, Debug)]
#[command(name = "ziti-ci")]
#[command(version, about)]
#[command(after_help = concat!(
    "ENVIRONMENT:\n",
    "  JFROG_API_KEY        Artifactory API key (required for publishing)\n",
    "  GITHUB_HEAD_REF      Branch name for pull request builds\n",
    "  GITHUB_REF_NAME      Branch name for push builds\n",
    "  GITHUB_RUN_NUMBER    CI build number used in snapshot versions\n",
    "  RUST_LOG             Log filter, overrides -v/-q\n\n",
    "EXAMPLES:\n",
    "  Publish everything under ./release:\n",
    "    $ ziti-ci publish-to-artifactory\n\n",
    "  Show what would be uploaded:\n",
    "    $ ziti-ci publish-to-artifactory --dry-run --branch feature/foo --build-number 42\n",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Publishes release artifacts to Artifactory.
    PublishToArtifactory(PublishArgs),
}

/// Arguments for `publish-to-artifactory`.
#[derive(Args, Debug, Clone, Default)]
pub struct PublishArgs {
    /// Root of the `<arch>/<os>/<file>` release tree [default: release].
    #[arg(long, value_name = "DIR")]
    pub release_dir: Option<Utf8PathBuf>,

    /// Configuration file; missing files fall back to defaults.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: Utf8PathBuf,

    /// Branch to publish from [default: detected from CI or git].
    #[arg(long, value_name = "NAME")]
    pub branch: Option<String>,

    /// CI build number appended to snapshot versions.
    #[arg(long, value_name = "N")]
    pub build_number: Option<String>,

    /// Resolve versions and print the upload plan without packaging or uploading.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Log level implied by `-v` and `-q`.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Warn;
        }
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl PublishArgs {
    /// Loads the configuration file and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but is invalid.
    pub fn to_request(&self) -> Result<PublishRequest> {
        let mut config = PublishConfig::load(&self.config)?;
        if let Some(release_dir) = &self.release_dir {
            config.release_dir.clone_from(release_dir);
        }

        Ok(PublishRequest {
            config,
            overrides: ContextOverrides {
                branch: self.branch.clone(),
                build_number: self.build_number.clone(),
            },
            dry_run: self.dry_run,
        })
    }
}
