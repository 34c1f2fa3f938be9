//! Ziti release publisher library.
//!
//! Packages the binaries found under `release/<arch>/<os>/` into `.tar.gz`
//! archives and publishes them to Artifactory through `jfrog-cli`. Used by
//! the `ziti-ci` binary and usable directly for testing the workflow with
//! substituted command executors and repositories.
//!
//! # Modules
//!
//! - [`artifact`] - Release tree discovery and artifact descriptors
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - External command execution abstraction
//! - [`config`] - Configuration file and credential handling
//! - [`error`] - Error types
//! - [`packaging`] - `.tar.gz` archive creation
//! - [`packaging_error`] - Packaging error types
//! - [`publish`] - Publish workflow orchestration
//! - [`repository`] - Artifact repository interface and `jfrog-cli` client
//! - [`version`] - Branch, version, and build number resolution

pub mod artifact;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod packaging;
pub mod packaging_error;
pub mod publish;
pub mod repository;
pub mod version;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
