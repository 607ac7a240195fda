//! Input discovery.
//!
//! Finds the SVG files directly inside an input folder. Subdirectories are
//! not descended into, so an output root placed inside the input folder is
//! never picked up as input on a rerun.
//!
//! ```text
//! artwork/                 # input folder
//! ├── badge.SVG            # ✓ extension match is case-insensitive
//! ├── logo.svg             # ✓
//! ├── notes.txt            # ✗ not an SVG
//! └── Microstock_Ready/    # ✗ not descended into
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Case-insensitive `.svg` extension check.
pub fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// All `*.svg` files directly inside `dir`, sorted by file name.
///
/// An empty result is not an error.
pub fn discover_svgs(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && is_svg(entry.path()) {
            found.push(entry.into_path());
        }
    }
    if found.is_empty() {
        tracing::warn!(dir = %dir.display(), "no SVG files found");
    }
    Ok(found)
}
