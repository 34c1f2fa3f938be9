//! Branch, version, and build number resolution.
//!
//! The base version (`MAJOR.MINOR`) is kept in a `version` file at the
//! repository root. Patch numbers come from git tags of the form
//! `vMAJOR.MINOR.PATCH`:
//!
//! - the *current* version is the highest such tag pointing at `HEAD`, if any;
//! - the *next* version is one patch above the highest tag for the base
//!   version, or `MAJOR.MINOR.0` when no tag exists yet.
//!
//! Uploads use the current version when `HEAD` is tagged and the next
//! version otherwise. Snapshot uploads (non-release branches) append the CI
//! build number.

use crate::command::{CommandExecutor, capture_stdout};
use crate::config::PublishConfig;
use crate::error::{PublishError, Result};
use camino::Utf8Path;
use log::{debug, info};
use semver::Version;

/// Environment variables consulted for the branch name, in order.
pub const BRANCH_ENV_VARS: [&str; 2] = ["GITHUB_HEAD_REF", "GITHUB_REF_NAME"];

/// Environment variables consulted for the CI build number, in order.
pub const BUILD_NUMBER_ENV_VARS: [&str; 2] = ["GITHUB_RUN_NUMBER", "TRAVIS_BUILD_NUMBER"];

/// Values supplied explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverrides {
    /// Branch name to use instead of detecting it.
    pub branch: Option<String>,
    /// Build number to use instead of reading it from the environment.
    pub build_number: Option<String>,
}

/// Resolved branch and version state for one publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseContext {
    /// Branch being published.
    pub branch: String,
    /// Whether `branch` publishes finalized versions.
    pub release: bool,
    /// Version tagged at `HEAD`, if any.
    pub current_version: Option<Version>,
    /// Version the next release will carry.
    pub next_version: Version,
    /// CI build number, if known.
    pub build_number: Option<String>,
}

impl ReleaseContext {
    /// Resolves the context from git, the environment, and `overrides`.
    ///
    /// `lookup` reads environment variables; the version file is read from
    /// `config.version_file`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::VersionResolution`] when the branch or base
    /// version cannot be determined, or the error of any failing git command.
    pub fn resolve(
        executor: &dyn CommandExecutor,
        config: &PublishConfig,
        overrides: &ContextOverrides,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let branch = resolve_branch(executor, overrides, lookup)?;
        let (major, minor) = read_base_version(&config.version_file)?;

        let head_tags = capture_stdout(
            executor,
            "Read tags at HEAD",
            "git",
            &["tag", "--points-at", "HEAD"],
        )?;
        let pattern = format!("v{major}.{minor}.*");
        let base_tags = capture_stdout(
            executor,
            "Read release tags",
            "git",
            &["tag", "--list", &pattern],
        )?;

        let context = Self {
            release: config.is_release_branch(&branch),
            current_version: current_version(&head_tags),
            next_version: next_version(major, minor, &base_tags),
            build_number: first_set(overrides.build_number.clone(), &BUILD_NUMBER_ENV_VARS, lookup),
            branch,
        };

        info!(
            "branch {} (release: {}), current version {}, next version {}",
            context.branch,
            context.release,
            context
                .current_version
                .as_ref()
                .map_or_else(|| "<none>".to_owned(), Version::to_string),
            context.next_version
        );
        Ok(context)
    }

    /// Version being published: the current version if `HEAD` is tagged,
    /// otherwise the next version.
    ///
    /// When rolling a major or minor number there is no current version, so
    /// the next version is used.
    #[must_use]
    pub fn publish_version(&self) -> &Version {
        self.current_version.as_ref().unwrap_or(&self.next_version)
    }

    /// Version string used in destination paths and properties.
    ///
    /// Release branches use [`Self::publish_version`] as-is; other branches
    /// append `-<build number>`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::VersionResolution`] when a snapshot version is
    /// needed but no build number is known.
    ///
    /// # Examples
    ///
    /// ```
    /// use semver::Version;
    /// use ziti_ci_publisher::version::ReleaseContext;
    ///
    /// let context = ReleaseContext {
    ///     branch: "foo".to_owned(),
    ///     release: false,
    ///     current_version: None,
    ///     next_version: Version::new(1, 3, 0),
    ///     build_number: Some("42".to_owned()),
    /// };
    /// assert_eq!(context.upload_version()?, "1.3.0-42");
    /// # Ok::<(), ziti_ci_publisher::error::PublishError>(())
    /// ```
    pub fn upload_version(&self) -> Result<String> {
        let version = self.publish_version().to_string();
        if self.release {
            return Ok(version);
        }
        match &self.build_number {
            Some(build_number) => Ok(format!("{version}-{build_number}")),
            None => Err(PublishError::VersionResolution {
                reason: format!(
                    "build number required for snapshot publishing from branch {}; \
                     pass --build-number or set {}",
                    self.branch,
                    BUILD_NUMBER_ENV_VARS.join(" or ")
                ),
            }),
        }
    }
}

fn resolve_branch(
    executor: &dyn CommandExecutor,
    overrides: &ContextOverrides,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<String> {
    if let Some(branch) = first_set(overrides.branch.clone(), &BRANCH_ENV_VARS, lookup) {
        return Ok(branch);
    }

    let branch = capture_stdout(
        executor,
        "Read current branch",
        "git",
        &["rev-parse", "--abbrev-ref", "HEAD"],
    )?;
    if branch.is_empty() || branch == "HEAD" {
        return Err(PublishError::VersionResolution {
            reason: "HEAD is detached; pass --branch".to_owned(),
        });
    }
    Ok(branch)
}

/// Returns the explicit value or the first non-empty environment variable.
fn first_set(
    explicit: Option<String>,
    vars: &[&str],
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Option<String> {
    explicit.filter(|v| !v.is_empty()).or_else(|| {
        vars.iter()
            .filter_map(|var| lookup(*var))
            .find(|v| !v.is_empty())
    })
}

fn read_base_version(path: &Utf8Path) -> Result<(u64, u64)> {
    let contents = std::fs::read_to_string(path).map_err(|e| PublishError::VersionResolution {
        reason: format!("failed to read {path}: {e}"),
    })?;
    parse_base_version(&contents).ok_or_else(|| PublishError::VersionResolution {
        reason: format!("{path} must contain MAJOR.MINOR, found {:?}", contents.trim()),
    })
}

/// Parses a `MAJOR.MINOR` base version.
///
/// # Examples
///
/// ```
/// use ziti_ci_publisher::version::parse_base_version;
///
/// assert_eq!(parse_base_version("0.31\n"), Some((0, 31)));
/// assert_eq!(parse_base_version("0.31.2"), None);
/// ```
#[must_use]
pub fn parse_base_version(contents: &str) -> Option<(u64, u64)> {
    let (major, minor) = contents.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Parses a `vX.Y.Z` tag into a version.
#[must_use]
pub fn parse_tag(tag: &str) -> Option<Version> {
    Version::parse(tag.trim().strip_prefix('v')?).ok()
}

/// Highest version among newline-separated tags, ignoring non-version tags.
#[must_use]
pub fn current_version(tags: &str) -> Option<Version> {
    tags.lines().filter_map(parse_tag).max()
}

/// Next patch release for `major.minor` given the existing tags.
///
/// # Examples
///
/// ```
/// use semver::Version;
/// use ziti_ci_publisher::version::next_version;
///
/// assert_eq!(next_version(0, 31, "v0.31.0\nv0.31.4\nv0.31.2"), Version::new(0, 31, 5));
/// assert_eq!(next_version(0, 32, ""), Version::new(0, 32, 0));
/// ```
#[must_use]
pub fn next_version(major: u64, minor: u64, tags: &str) -> Version {
    let highest_patch = tags
        .lines()
        .filter_map(parse_tag)
        .filter(|v| v.major == major && v.minor == minor)
        .map(|v| v.patch)
        .max();
    debug!("highest patch for {major}.{minor}: {highest_patch:?}");
    Version::new(major, minor, highest_patch.map_or(0, |patch| patch + 1))
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
