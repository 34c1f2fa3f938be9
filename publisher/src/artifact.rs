//! Release artifact discovery.
//!
//! The release tree has a fixed two-level layout:
//!
//! ```text
//! {release_dir}/{arch}/{os}/{file}
//! ```
//!
//! Every regular file at the third level becomes an [`Artifact`] unless it
//! is already a `.gz` archive.

use crate::error::{PublishError, Result};
use camino::{Utf8DirEntry, Utf8Path, Utf8PathBuf};
use log::{debug, info};

/// Suffix of files that are already packaged and must not be re-archived.
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// Suffix stripped from executable names when deriving the artifact name.
pub const EXECUTABLE_SUFFIX: &str = ".exe";

/// Suffix of archives produced by the packager.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// One releasable binary and where its archive will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    name: String,
    source_name: String,
    source_path: Utf8PathBuf,
    artifact_archive: String,
    artifact_path: Utf8PathBuf,
    arch: String,
    os: String,
}

impl Artifact {
    /// Builds a descriptor for the file at `source_path`.
    ///
    /// Returns `None` when the file name marks an already-compressed file
    /// or when `source_path` has no file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use ziti_ci_publisher::artifact::Artifact;
    ///
    /// let source = Utf8Path::new("release/amd64/windows/ziti.exe");
    /// let artifact = Artifact::new(source, "amd64", "windows").expect("not compressed");
    /// assert_eq!(artifact.name(), "ziti");
    /// assert_eq!(artifact.artifact_archive(), "ziti.tar.gz");
    /// assert_eq!(artifact.artifact_path().as_str(), "release/amd64/windows/ziti.tar.gz");
    /// ```
    #[must_use]
    pub fn new(source_path: &Utf8Path, arch: &str, os: &str) -> Option<Self> {
        let source_name = source_path.file_name()?;
        let name = artifact_name(source_name)?;
        let artifact_archive = format!("{name}{ARCHIVE_SUFFIX}");
        let artifact_path = match source_path.parent() {
            Some(dir) => dir.join(&artifact_archive),
            None => Utf8PathBuf::from(&artifact_archive),
        };

        Some(Self {
            name,
            source_name: source_name.to_owned(),
            source_path: source_path.to_owned(),
            artifact_archive,
            artifact_path,
            arch: arch.to_owned(),
            os: os.to_owned(),
        })
    }

    /// Artifact name: the source file name without any `.exe` suffix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Original file name in the release tree.
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Path to the original file.
    #[must_use]
    pub fn source_path(&self) -> &Utf8Path {
        &self.source_path
    }

    /// File name of the archive, `<name>.tar.gz`.
    #[must_use]
    pub fn artifact_archive(&self) -> &str {
        &self.artifact_archive
    }

    /// Path where the archive is written, next to the source file.
    #[must_use]
    pub fn artifact_path(&self) -> &Utf8Path {
        &self.artifact_path
    }

    /// Architecture directory the file was found under.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Operating system directory the file was found under.
    #[must_use]
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Member name used inside the aggregate archive.
    #[must_use]
    pub fn aggregate_member_name(&self) -> String {
        format!("{}/{}/{}", self.arch, self.os, self.source_name)
    }
}

/// Derives the artifact name from a file name.
///
/// Returns `None` for files that are already compressed.
///
/// # Examples
///
/// ```
/// use ziti_ci_publisher::artifact::artifact_name;
///
/// assert_eq!(artifact_name("ziti.exe").as_deref(), Some("ziti"));
/// assert_eq!(artifact_name("ziti").as_deref(), Some("ziti"));
/// assert_eq!(artifact_name("ziti.tar.gz"), None);
/// ```
#[must_use]
pub fn artifact_name(file_name: &str) -> Option<String> {
    if file_name.ends_with(COMPRESSED_SUFFIX) {
        return None;
    }
    let name = file_name
        .strip_suffix(EXECUTABLE_SUFFIX)
        .unwrap_or(file_name);
    Some(name.to_owned())
}

/// Walks `release_dir` and returns a descriptor for every releasable file.
///
/// Entries are visited in lexicographic order at every level so that the
/// publish order is stable between runs.
///
/// # Errors
///
/// Returns [`PublishError::DirectoryUnreadable`] if any directory in the
/// tree (including `release_dir` itself) cannot be read, and
/// [`PublishError::NonUtf8Path`] for entries whose names are not UTF-8.
pub fn discover_artifacts(release_dir: &Utf8Path) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    for arch_entry in sorted_entries(release_dir)? {
        if !is_dir(&arch_entry) {
            debug!("skipping non-directory {}", arch_entry.path());
            continue;
        }
        let arch = arch_entry.file_name();
        info!("processing files for arch: {arch}");

        for os_entry in sorted_entries(arch_entry.path())? {
            if !is_dir(&os_entry) {
                debug!("skipping non-directory {}", os_entry.path());
                continue;
            }
            let os = os_entry.file_name();
            info!("processing files for: {arch}/{os}");

            collect_releasable_files(os_entry.path(), arch, os, &mut artifacts)?;
        }
    }

    Ok(artifacts)
}

/// Appends descriptors for the files directly inside one `<arch>/<os>` directory.
fn collect_releasable_files(
    os_dir: &Utf8Path,
    arch: &str,
    os: &str,
    artifacts: &mut Vec<Artifact>,
) -> Result<()> {
    for entry in sorted_entries(os_dir)? {
        if is_dir(&entry) {
            continue;
        }
        match Artifact::new(entry.path(), arch, os) {
            Some(artifact) => artifacts.push(artifact),
            None => debug!("skipping already packaged {}", entry.path()),
        }
    }
    Ok(())
}

/// Reads a directory and returns its entries sorted by file name.
fn sorted_entries(dir: &Utf8Path) -> Result<Vec<Utf8DirEntry>> {
    let unreadable = |source| PublishError::DirectoryUnreadable {
        path: dir.to_owned(),
        source,
    };

    let mut entries = Vec::new();
    for entry in dir.read_dir_utf8().map_err(unreadable)? {
        entries.push(entry.map_err(|e| entry_error(dir, e))?);
    }
    entries.sort_by(|a, b| a.file_name().cmp(b.file_name()));
    Ok(entries)
}

/// Maps a directory iteration error, recognising camino's non-UTF-8 report.
fn entry_error(dir: &Utf8Path, err: std::io::Error) -> PublishError {
    if let Some(inner) = err
        .get_ref()
        .and_then(|e| e.downcast_ref::<camino::FromPathBufError>())
    {
        return PublishError::NonUtf8Path(inner.as_path().to_path_buf());
    }
    PublishError::DirectoryUnreadable {
        path: dir.to_owned(),
        source: err,
    }
}

/// Symlinks are not followed: a linked directory counts as a plain entry.
fn is_dir(entry: &Utf8DirEntry) -> bool {
    entry.file_type().is_ok_and(|t| t.is_dir())
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
