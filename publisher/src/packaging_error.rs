//! Error types for archive packaging.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising while writing `.tar.gz` archives.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// Reading a source file or writing the archive failed.
    #[error("failed to package {archive}: {source}")]
    Io {
        /// The archive being written.
        archive: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No files were provided for the archive.
    #[error("no files provided for packaging")]
    EmptyFileList,
}
