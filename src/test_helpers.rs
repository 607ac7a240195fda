//! Shared test utilities for the microstock-export test suite.
//!
//! Fixture SVG writers and, on unix, fake vector tool executables that stand
//! in for Inkscape.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_input_dir();
//! let tool = write_working_tool(tmp.path());
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Fixture SVGs
// =========================================================================

/// 200×100 logo: left half transparent, right half opaque red.
pub const LOGO_SVG: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100" viewBox="0 0 200 100">
  <rect x="100" y="0" width="100" height="100" fill="#ff0000"/>
</svg>
"##;

/// Square badge sized only through its viewBox.
pub const BADGE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64">
  <circle cx="32" cy="32" r="30" fill="#0044cc"/>
</svg>
"##;

pub fn write_logo_svg(path: &Path) {
    std::fs::write(path, LOGO_SVG).unwrap();
}

/// Input folder with two SVGs, a non-SVG file, and a nested SVG that
/// discovery must ignore.
pub fn setup_input_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_logo_svg(&tmp.path().join("logo.svg"));
    std::fs::write(tmp.path().join("badge.SVG"), BADGE_SVG).unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "not an svg").unwrap();
    std::fs::create_dir(tmp.path().join("drafts")).unwrap();
    write_logo_svg(&tmp.path().join("drafts/old.svg"));
    tmp
}

// =========================================================================
// Fake vector tools
// =========================================================================

/// Writes the received arguments into the file named after `-o`.
#[cfg(unix)]
pub fn write_working_tool(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "inkscape-ok",
        r#"out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
done
echo "$@" > "$out"
"#,
    )
}

/// Prints to stderr and exits with status 3.
#[cfg(unix)]
pub fn write_failing_tool(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "inkscape-fail",
        "echo \"simulated failure\" >&2\nexit 3\n",
    )
}

/// Exits 0 without writing anything.
#[cfg(unix)]
pub fn write_silent_tool(dir: &Path) -> PathBuf {
    write_script(dir, "inkscape-silent", "exit 0\n")
}

/// Hangs until killed.
#[cfg(unix)]
pub fn write_sleeping_tool(dir: &Path) -> PathBuf {
    write_script(dir, "inkscape-slow", "exec sleep 30\n")
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
