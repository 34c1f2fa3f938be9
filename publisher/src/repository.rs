//! Artifact repository client.
//!
//! [`ArtifactRepository`] is the narrow interface the publish workflow talks
//! to. [`JfrogCli`] implements it by shelling out to `jfrog-cli`; the tool
//! itself is an external dependency and is never reimplemented here.

use crate::command::{CommandExecutor, run_checked};
use crate::config::{Credential, PublishConfig};
use crate::error::Result;
use camino::Utf8PathBuf;
use std::fmt;

/// Ordered `key=value` metadata attached to an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(Vec<(String, String)>);

impl Properties {
    /// Creates an empty property list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a property, keeping insertion order.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.push((key.to_owned(), value.into()));
        self
    }

    /// Returns the value of the first property named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Renders as `k1=v1;k2=v2`, the format `jfrog-cli --props` expects.
///
/// # Examples
///
/// ```
/// use ziti_ci_publisher::repository::Properties;
///
/// let props = Properties::new().with("version", "1.2.3").with("branch", "main");
/// assert_eq!(props.to_string(), "version=1.2.3;branch=main");
/// ```
impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(";")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// One file to upload and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Artifact name, used in progress and error messages.
    pub name: String,
    /// Local archive to upload.
    pub source: Utf8PathBuf,
    /// Repository path, e.g. `ziti-staging/ziti/amd64/linux/1.2.3/ziti.tar.gz`.
    pub destination: String,
    /// Metadata attached to the uploaded file.
    pub properties: Properties,
    /// Build the upload is recorded against.
    pub build_name: String,
    /// Build number the upload is recorded against.
    pub build_number: String,
}

/// Operations the publish workflow needs from the artifact repository.
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactRepository {
    /// Uploads one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails.
    fn upload(&self, request: &UploadRequest) -> Result<()>;

    /// Finalizes and registers the build record `build_name`/`version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the build cannot be registered.
    fn finalize_build(&self, build_name: &str, version: &str) -> Result<()>;
}

/// [`ArtifactRepository`] backed by the `jfrog-cli` executable.
pub struct JfrogCli<'a> {
    executor: &'a dyn CommandExecutor,
    program: String,
    url: String,
    credential: Credential,
}

impl<'a> JfrogCli<'a> {
    /// Creates a client that runs `config.cli_program` through `executor`.
    #[must_use]
    pub fn new(
        executor: &'a dyn CommandExecutor,
        config: &PublishConfig,
        credential: Credential,
    ) -> Self {
        Self {
            executor,
            program: config.cli_program.clone(),
            url: config.artifactory_url.clone(),
            credential,
        }
    }
}

impl fmt::Debug for JfrogCli<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JfrogCli")
            .field("program", &self.program)
            .field("url", &self.url)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl ArtifactRepository for JfrogCli<'_> {
    fn upload(&self, request: &UploadRequest) -> Result<()> {
        let props = request.properties.to_string();
        let build_name = format!("--build-name={}", request.build_name);
        let build_number = format!("--build-number={}", request.build_number);
        let description = format!("Publish artifact for {}", request.name);

        run_checked(
            self.executor,
            &description,
            &self.program,
            &[
                "rt",
                "u",
                request.source.as_str(),
                &request.destination,
                "--apikey",
                self.credential.expose(),
                "--url",
                &self.url,
                "--props",
                &props,
                &build_name,
                &build_number,
            ],
        )?;
        Ok(())
    }

    fn finalize_build(&self, build_name: &str, version: &str) -> Result<()> {
        run_checked(
            self.executor,
            "Set build version",
            &self.program,
            &["rt", "bce", build_name, version],
        )?;
        run_checked(
            self.executor,
            "Create build in Artifactory",
            &self.program,
            &[
                "rt",
                "bp",
                "--apikey",
                self.credential.expose(),
                "--url",
                &self.url,
                build_name,
                version,
            ],
        )?;
        Ok(())
    }
}
