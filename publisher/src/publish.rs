//! Publish workflow orchestration.
//!
//! The run is strictly linear and stops at the first error:
//!
//! 1. read the repository credential,
//! 2. resolve branch and version,
//! 3. discover artifacts under the release directory,
//! 4. package each artifact and the aggregate archive,
//! 5. upload every archive, then (release branches only) upload the
//!    aggregate and register the build.
//!
//! Steps 1-3 are free of side effects, so a dry run stops after computing
//! the [`PublishPlan`].

use crate::artifact::{Artifact, discover_artifacts};
use crate::command::CommandExecutor;
use crate::config::{PublishConfig, read_credential};
use crate::error::Result;
use crate::packaging::{package_aggregate, package_artifact};
use crate::repository::{ArtifactRepository, JfrogCli, Properties, UploadRequest};
use crate::version::{ContextOverrides, ReleaseContext};
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};

/// Build record registered after a release upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    /// Build name, e.g. `ziti`.
    pub build_name: String,
    /// Version the build is registered under.
    pub version: String,
}

/// Every repository operation a run will perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlan {
    /// Per-artifact uploads.
    pub uploads: Vec<UploadRequest>,
    /// Aggregate archive upload (release branches only).
    pub aggregate: Option<UploadRequest>,
    /// Build registration (release branches only).
    pub build: Option<BuildRecord>,
}

/// Inputs for one publish run.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    /// Effective configuration.
    pub config: PublishConfig,
    /// Branch and build number supplied on the command line.
    pub overrides: ContextOverrides,
    /// Compute and log the plan without packaging or uploading.
    pub dry_run: bool,
}

/// Repository path for one artifact.
///
/// Release branches publish to the staging repository; every other branch
/// publishes to the snapshot repository under a branch-named folder.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use semver::Version;
/// use ziti_ci_publisher::artifact::Artifact;
/// use ziti_ci_publisher::config::PublishConfig;
/// use ziti_ci_publisher::publish::destination_key;
/// use ziti_ci_publisher::version::ReleaseContext;
///
/// let artifact = Artifact::new(Utf8Path::new("release/amd64/linux/ziti"), "amd64", "linux")
///     .expect("not compressed");
/// let context = ReleaseContext {
///     branch: "main".to_owned(),
///     release: true,
///     current_version: Some(Version::new(1, 2, 3)),
///     next_version: Version::new(1, 2, 4),
///     build_number: None,
/// };
/// assert_eq!(
///     destination_key(&PublishConfig::default(), &context, &artifact, "1.2.3"),
///     "ziti-staging/ziti/amd64/linux/1.2.3/ziti.tar.gz"
/// );
/// ```
#[must_use]
pub fn destination_key(
    config: &PublishConfig,
    context: &ReleaseContext,
    artifact: &Artifact,
    version: &str,
) -> String {
    let channel = if context.release {
        config.staging_repository.clone()
    } else {
        format!("{}/{}", config.snapshot_repository, context.branch)
    };
    format!(
        "{channel}/{}/{}/{}/{version}/{}",
        artifact.name(),
        artifact.arch(),
        artifact.os(),
        artifact.artifact_archive()
    )
}

/// Repository path for the aggregate archive,
/// `<staging>/<aggregate>/<version>/<aggregate>.<version>.tar.gz`.
#[must_use]
pub fn aggregate_destination(config: &PublishConfig, version: &str) -> String {
    let name = &config.aggregate_name;
    format!(
        "{}/{name}/{version}/{name}.{version}.tar.gz",
        config.staging_repository
    )
}

/// Metadata attached to a per-artifact upload.
#[must_use]
pub fn artifact_properties(context: &ReleaseContext, artifact: &Artifact, version: &str) -> Properties {
    Properties::new()
        .with("version", version)
        .with("name", artifact.name())
        .with("arch", artifact.arch())
        .with("os", artifact.os())
        .with("branch", context.branch.as_str())
}

/// Computes every upload for `artifacts`.
///
/// `version` is the upload version from [`ReleaseContext::upload_version`].
/// Uploads are recorded against the build number equal to the publish
/// version, which is what the build registration step expects.
#[must_use]
pub fn plan_publication(
    config: &PublishConfig,
    context: &ReleaseContext,
    version: &str,
    artifacts: &[Artifact],
    aggregate_path: &Utf8Path,
) -> PublishPlan {
    let build_number = context.publish_version().to_string();
    let uploads = artifacts
        .iter()
        .map(|artifact| UploadRequest {
            name: artifact.name().to_owned(),
            source: artifact.artifact_path().to_owned(),
            destination: destination_key(config, context, artifact, version),
            properties: artifact_properties(context, artifact, version),
            build_name: config.build_name.clone(),
            build_number: build_number.clone(),
        })
        .collect();

    if !context.release {
        return PublishPlan {
            uploads,
            aggregate: None,
            build: None,
        };
    }

    let aggregate = UploadRequest {
        name: config.aggregate_name.clone(),
        source: aggregate_path.to_owned(),
        destination: aggregate_destination(config, version),
        properties: Properties::new()
            .with("version", version)
            .with("branch", context.branch.as_str()),
        build_name: config.build_name.clone(),
        build_number,
    };
    PublishPlan {
        uploads,
        aggregate: Some(aggregate),
        build: Some(BuildRecord {
            build_name: config.build_name.clone(),
            version: version.to_owned(),
        }),
    }
}

/// Performs the plan against `repository`, stopping at the first failure.
///
/// # Errors
///
/// Returns the first error reported by the repository.
pub fn execute_plan(plan: &PublishPlan, repository: &dyn ArtifactRepository) -> Result<()> {
    for upload in &plan.uploads {
        repository.upload(upload)?;
    }
    if let Some(aggregate) = &plan.aggregate {
        repository.upload(aggregate)?;
    }
    if let Some(build) = &plan.build {
        repository.finalize_build(&build.build_name, &build.version)?;
    }
    Ok(())
}

/// Runs the whole publish workflow.
///
/// `lookup` reads environment variables. External commands (`git`,
/// `jfrog-cli`) run through `executor`.
///
/// # Errors
///
/// Returns the first failure of any stage; nothing is retried.
pub fn run_publish(
    request: &PublishRequest,
    executor: &dyn CommandExecutor,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<PublishPlan> {
    let config = &request.config;
    let credential = read_credential(config, lookup)?;

    let context = ReleaseContext::resolve(executor, config, &request.overrides, lookup)?;
    let version = context.upload_version()?;

    let artifacts = discover_artifacts(&config.release_dir)?;
    if artifacts.is_empty() {
        warn!("no releasable files found under {}", config.release_dir);
    }

    let aggregate_path = aggregate_archive_path(config);
    let plan = plan_publication(config, &context, &version, &artifacts, &aggregate_path);

    if request.dry_run {
        log_plan(&plan);
        return Ok(plan);
    }

    for artifact in &artifacts {
        package_artifact(artifact)?;
    }
    package_aggregate(&aggregate_path, &artifacts)?;

    let repository = JfrogCli::new(executor, config, credential);
    execute_plan(&plan, &repository)?;

    info!(
        "published {} artifact(s) as version {version}",
        plan.uploads.len()
    );
    Ok(plan)
}

/// Location of the aggregate archive inside the release directory.
#[must_use]
pub fn aggregate_archive_path(config: &PublishConfig) -> Utf8PathBuf {
    config.release_dir.join(config.aggregate_archive_name())
}

fn log_plan(plan: &PublishPlan) {
    warn!("dry run: no archives will be written and nothing will be uploaded");
    for upload in plan.uploads.iter().chain(plan.aggregate.iter()) {
        info!(
            "would upload {} -> {} [{}]",
            upload.source, upload.destination, upload.properties
        );
    }
    if let Some(build) = &plan.build {
        info!(
            "would register build {} {}",
            build.build_name, build.version
        );
    }
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
