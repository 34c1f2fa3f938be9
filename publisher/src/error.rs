//! Error types for the publisher.
//!
//! Every failure in the publish workflow is fatal: the variants below exist
//! so the operator can see which stage stopped the run and why, not so
//! callers can recover.

use crate::packaging_error::PackagingError;
use camino::Utf8PathBuf;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while packaging and publishing release artifacts.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The repository credential was not present in the environment.
    #[error("{variable} not specified")]
    MissingCredential {
        /// Name of the environment variable that must hold the credential.
        variable: String,
    },

    /// The configuration file exists but could not be read or parsed.
    #[error("invalid configuration at {path}: {reason}")]
    ConfigInvalid {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the read or parse error.
        reason: String,
    },

    /// Branch, version, or build number could not be determined.
    #[error("version resolution failed: {reason}")]
    VersionResolution {
        /// Description of what could not be resolved.
        reason: String,
    },

    /// A directory in the release tree could not be read.
    #[error("failed to read directory {path}")]
    DirectoryUnreadable {
        /// The directory that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A path in the release tree is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// An archive could not be created.
    #[error(transparent)]
    Packaging(#[from] PackagingError),

    /// An external command exited unsuccessfully.
    #[error("{description} failed ({status}): {stderr}")]
    CommandFailed {
        /// Human-readable description of the step that ran the command.
        description: String,
        /// Exit status reported by the process.
        status: ExitStatus,
        /// Trimmed standard error output of the process.
        stderr: String,
    },

    /// An I/O operation failed (spawning a process, writing output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`PublishError`].
pub type Result<T> = std::result::Result<T, PublishError>;
