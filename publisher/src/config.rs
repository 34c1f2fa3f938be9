//! Publisher configuration.
//!
//! Settings live in an optional `ziti-ci.toml`. Every key has a default
//! matching the NetFoundry Artifactory layout, so a missing file is not an
//! error. The repository credential is never read from the file; it comes
//! from the environment variable named by [`PublishConfig::credential_env`].

use crate::error::{PublishError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fmt;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ziti-ci.toml";

/// Settings for packaging and publishing release artifacts.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Base URL of the Artifactory server passed to `--url`.
    pub artifactory_url: String,
    /// Program name of the Artifactory CLI.
    pub cli_program: String,
    /// Environment variable holding the Artifactory API key.
    pub credential_env: String,
    /// Build name recorded with every upload and used for build records.
    pub build_name: String,
    /// Repository receiving uploads from release branches.
    pub staging_repository: String,
    /// Repository receiving uploads from every other branch.
    pub snapshot_repository: String,
    /// Name of the aggregate archive bundling every artifact.
    pub aggregate_name: String,
    /// Branch names that publish finalized versions.
    pub release_branches: Vec<String>,
    /// Branch name prefixes that publish finalized versions.
    pub release_branch_prefixes: Vec<String>,
    /// Root of the `<arch>/<os>/<file>` release tree.
    pub release_dir: Utf8PathBuf,
    /// File holding the `MAJOR.MINOR` base version.
    pub version_file: Utf8PathBuf,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            artifactory_url: "https://netfoundry.jfrog.io/netfoundry".to_owned(),
            cli_program: "jfrog-cli".to_owned(),
            credential_env: "JFROG_API_KEY".to_owned(),
            build_name: "ziti".to_owned(),
            staging_repository: "ziti-staging".to_owned(),
            snapshot_repository: "ziti-snapshot".to_owned(),
            aggregate_name: "ziti-all".to_owned(),
            release_branches: vec!["main".to_owned(), "master".to_owned()],
            release_branch_prefixes: vec!["release-v".to_owned()],
            release_dir: Utf8PathBuf::from("release"),
            version_file: Utf8PathBuf::from("version"),
        }
    }
}

impl PublishConfig {
    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ConfigInvalid`] if the file exists but cannot
    /// be read or is not valid TOML for this schema.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no configuration at {path}, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| PublishError::ConfigInvalid {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        Self::parse(path, &contents)
    }

    /// Parses configuration from TOML text. `path` is used for error
    /// reporting only.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ConfigInvalid`] on malformed TOML or unknown
    /// keys.
    pub fn parse(path: &Utf8Path, contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| PublishError::ConfigInvalid {
            path: path.to_owned(),
            reason: e.message().to_owned(),
        })
    }

    /// Returns true when `branch` publishes finalized versions rather than
    /// snapshots.
    ///
    /// # Examples
    ///
    /// ```
    /// use ziti_ci_publisher::config::PublishConfig;
    ///
    /// let config = PublishConfig::default();
    /// assert!(config.is_release_branch("main"));
    /// assert!(config.is_release_branch("release-v0.31"));
    /// assert!(!config.is_release_branch("feature/foo"));
    /// ```
    #[must_use]
    pub fn is_release_branch(&self, branch: &str) -> bool {
        self.release_branches.iter().any(|b| b == branch)
            || self
                .release_branch_prefixes
                .iter()
                .any(|prefix| branch.starts_with(prefix.as_str()))
    }

    /// File name of the aggregate archive, e.g. `ziti-all.tar.gz`.
    #[must_use]
    pub fn aggregate_archive_name(&self) -> String {
        format!("{}.tar.gz", self.aggregate_name)
    }
}

/// Artifactory API key read from the environment.
///
/// The value is redacted from `Debug` output so it cannot leak through
/// logged structures.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw credential value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw credential for passing to the external tool.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Reads the credential named by `config.credential_env` using `lookup`.
///
/// Unset and empty values are both treated as missing.
///
/// # Errors
///
/// Returns [`PublishError::MissingCredential`] when the variable is absent.
pub fn read_credential(
    config: &PublishConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Credential> {
    lookup(&config.credential_env)
        .filter(|value| !value.is_empty())
        .map(Credential::new)
        .ok_or_else(|| PublishError::MissingCredential {
            variable: config.credential_env.clone(),
        })
}
