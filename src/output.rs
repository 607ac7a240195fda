//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Export
//!
//! ```text
//! === Starting Conversion ===
//! Files to process: 2
//! Selected platforms: Shutterstock, Canva
//! Scale factor: 2x
//! Output directory: artwork/Microstock_Ready
//! [  0%] [1/2] Processing logo.svg
//!     Processing: logo.svg
//!     Created EPS: artwork/Microstock_Ready/Shutterstock/logo.eps
//! ...
//! Processed 2/2 files: 4 outputs, 0 fallbacks, 0 failed
//! ```
//!
//! ## Platforms
//!
//! ```text
//! 001 shutterstock  Shutterstock (EPS)
//!     Steps: EPS
//!     Directory: Shutterstock/
//! ```
//!
//! ## Check
//!
//! ```text
//! SVG files (2)
//! 001 badge.SVG
//!     Size: 64 x 64
//! 002 logo.svg
//!     Size: 200 x 100
//!
//! Vector tool
//!     /usr/bin/inkscape
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::export::{ExportEvent, ExportJob, ExportReport};
use crate::imaging::SvgSize;
use crate::platform::Platform;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Export
// ============================================================================

/// Lines printed before a job starts.
pub fn format_job_header(job: &ExportJob) -> Vec<String> {
    let platforms: Vec<&str> = Platform::normalize(&job.platforms)
        .iter()
        .map(|p| p.display_name())
        .collect();
    let scale = if job.scale.force_square() {
        format!("{}x (square)", job.scale.factor())
    } else {
        format!("{}x", job.scale.factor())
    };
    vec![
        "=== Starting Conversion ===".to_string(),
        format!("Files to process: {}", job.sources.len()),
        format!("Selected platforms: {}", platforms.join(", ")),
        format!("Scale factor: {scale}"),
        format!("Output directory: {}", job.output_root.display()),
    ]
}

pub fn print_job_header(job: &ExportJob) {
    for line in format_job_header(job) {
        println!("{}", line);
    }
}

/// Format a single export event as display lines.
pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Progress { percent, message } => {
            vec![format!("[{:>3}%] {}", percent, message)]
        }
        ExportEvent::Log { message } => vec![format!("    {}", message)],
    }
}

/// Summary line followed by one line per failed step.
pub fn format_report(report: &ExportReport) -> Vec<String> {
    let failed = report.failures().count();
    let produced = report.records.len() - failed;
    let mut lines = Vec::new();
    if report.cancelled {
        lines.push("Conversion stopped by user".to_string());
    }
    lines.push(format!(
        "Processed {}/{} files: {}, {}, {} failed",
        report.files_processed,
        report.files_total,
        plural(produced, "output"),
        plural(report.fallback_count(), "fallback"),
        failed
    ));
    for record in report.failures() {
        lines.push(format!(
            "    ✗ {} {} {}: {}",
            record.platform.display_name(),
            file_name(&record.source),
            record.step,
            record.outcome.error_detail.as_deref().unwrap_or("unknown error")
        ));
    }
    lines
}

pub fn print_report(report: &ExportReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Platforms
// ============================================================================

/// The platform catalog with labels, steps and directory names.
pub fn format_platforms() -> Vec<String> {
    let mut lines = Vec::new();
    for (i, platform) in Platform::ALL.iter().enumerate() {
        let steps: Vec<&str> = platform.recipe().steps.iter().map(|s| s.label()).collect();
        lines.push(format!(
            "{} {:<13} {}",
            format_index(i + 1),
            platform.id(),
            platform.label()
        ));
        lines.push(format!("    Steps: {}", steps.join(", ")));
        lines.push(format!("    Directory: {}/", platform.display_name()));
    }
    lines
}

pub fn print_platforms() {
    for line in format_platforms() {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Discovered inputs with their intrinsic sizes, then the resolved tool.
pub fn format_check(inputs: &[(PathBuf, SvgSize)], tool: Option<&Path>) -> Vec<String> {
    let mut lines = vec![format!("SVG files ({})", inputs.len())];
    if inputs.is_empty() {
        lines.push("    WARNING: No SVG files found".to_string());
    }
    for (i, (path, size)) in inputs.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), file_name(path)));
        match size {
            SvgSize::Known { width, height } => {
                lines.push(format!("    Size: {} x {}", width, height));
            }
            SvgSize::Unknown { reason } => {
                lines.push(format!("    Size: unknown ({})", reason));
            }
        }
    }
    lines.push(String::new());
    lines.push("Vector tool".to_string());
    match tool {
        Some(path) => lines.push(format!("    {}", path.display())),
        None => lines.push("    not found (EPS fallback and cropping unavailable)".to_string()),
    }
    lines
}

pub fn print_check(inputs: &[(PathBuf, SvgSize)], tool: Option<&Path>) {
    for line in format_check(inputs, tool) {
        println!("{}", line);
    }
}
