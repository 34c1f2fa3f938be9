//! Archive creation for release artifacts.
//!
//! Each discovered file is compressed into its own `.tar.gz` next to the
//! source, and every file is also bundled into one aggregate archive at the
//! root of the release tree.

use crate::artifact::Artifact;
use crate::packaging_error::PackagingError;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use log::info;
use std::fs;

/// Create a `.tar.gz` archive at `output_path`.
///
/// Each entry in `files` is a `(source_path, archive_name)` pair. The
/// `archive_name` determines the member path inside the tar archive.
///
/// # Errors
///
/// Returns [`PackagingError::EmptyFileList`] when `files` is empty and
/// [`PackagingError::Io`] if any source file cannot be read or the output
/// file cannot be written.
pub fn create_archive(
    output_path: &Utf8Path,
    files: &[(Utf8PathBuf, String)],
) -> Result<(), PackagingError> {
    if files.is_empty() {
        return Err(PackagingError::EmptyFileList);
    }

    write_archive(output_path, files).map_err(|source| PackagingError::Io {
        archive: output_path.to_owned(),
        source,
    })
}

fn write_archive(output_path: &Utf8Path, files: &[(Utf8PathBuf, String)]) -> std::io::Result<()> {
    let output_file = fs::File::create(output_path)?;
    let encoder = GzEncoder::new(output_file, Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for (source_path, archive_name) in files {
        archive.append_path_with_name(source_path, archive_name)?;
    }

    archive.into_inner()?.finish()?;
    Ok(())
}

/// Compress a single artifact into `artifact.artifact_path()`.
///
/// The archive holds one member named after the original file.
///
/// # Errors
///
/// Returns [`PackagingError::Io`] if the archive cannot be written.
pub fn package_artifact(artifact: &Artifact) -> Result<(), PackagingError> {
    info!(
        "packaging releasable: {} -> {}",
        artifact.source_path(),
        artifact.artifact_path()
    );
    create_archive(
        artifact.artifact_path(),
        &[(
            artifact.source_path().to_owned(),
            artifact.source_name().to_owned(),
        )],
    )
}

/// Bundle every artifact into one archive at `output_path`.
///
/// Members are stored as `<arch>/<os>/<source_name>`. An empty `artifacts`
/// slice still writes a valid, empty archive.
///
/// # Errors
///
/// Returns [`PackagingError::Io`] if the archive cannot be written.
pub fn package_aggregate(
    output_path: &Utf8Path,
    artifacts: &[Artifact],
) -> Result<(), PackagingError> {
    info!(
        "packaging {} artifact(s) into {output_path}",
        artifacts.len()
    );
    let entries: Vec<(Utf8PathBuf, String)> = artifacts
        .iter()
        .map(|a| (a.source_path().to_owned(), a.aggregate_member_name()))
        .collect();
    write_archive(output_path, &entries).map_err(|source| PackagingError::Io {
        archive: output_path.to_owned(),
        source,
    })
}

#[cfg(test)]
#[path = "packaging_tests.rs"]
mod tests;
