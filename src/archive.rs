//! ZIP bundling for platforms that take archived deliverables.
//!
//! Archives are flat: each entry is named by the input's file name, with no
//! directory entries. Inputs that do not exist are skipped with a log line.

use crate::imaging::remove_stale;
use crate::types::ConversionOutcome;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("none of the files to archive exist")]
    NothingToArchive,
}

/// Bundle `paths` into a deflated ZIP at `archive_path`.
///
/// Any archive from an earlier run is removed first. When no input exists,
/// no archive is written and the outcome fails.
pub fn bundle(
    paths: &[PathBuf],
    archive_path: &Path,
    log: &mut Vec<String>,
) -> ConversionOutcome {
    let result = remove_stale(archive_path)
        .map_err(ArchiveError::from)
        .and_then(|()| write_archive(paths, archive_path, log));
    match result {
        Ok(count) => {
            log.push(format!(
                "Created ZIP ({count} files): {}",
                archive_path.display()
            ));
            ConversionOutcome::success(archive_path.to_path_buf())
        }
        Err(e) => {
            if !matches!(e, ArchiveError::NothingToArchive) {
                let _ = std::fs::remove_file(archive_path);
            }
            tracing::warn!(archive = %archive_path.display(), error = %e, "archive failed");
            log.push(format!("ERROR creating ZIP: {e}"));
            ConversionOutcome::failure(archive_path.to_path_buf(), e.to_string())
        }
    }
}

fn write_archive(
    paths: &[PathBuf],
    archive_path: &Path,
    log: &mut Vec<String>,
) -> Result<usize, ArchiveError> {
    let present: Vec<&PathBuf> = paths
        .iter()
        .filter(|p| {
            let exists = p.is_file();
            if !exists {
                log.push(format!("Skipped missing file: {}", p.display()));
            }
            exists
        })
        .collect();
    if present.is_empty() {
        return Err(ArchiveError::NothingToArchive);
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(BufWriter::new(File::create(archive_path)?));
    for path in &present {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        zip.start_file(name, options)?;
        io::copy(&mut File::open(path)?, &mut zip)?;
    }
    zip.finish()?;
    Ok(present.len())
}

/// Remove each of `paths`, logging every result. One failure does not stop
/// the rest.
pub fn delete_files(paths: &[PathBuf], log: &mut Vec<String>) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => log.push(format!("Deleted file: {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "delete failed");
                log.push(format!("ERROR deleting file {}: {e}", path.display()));
            }
        }
    }
}
