//! Shared types used across the export pipeline.
//!
//! [`ScalePolicy`] governs every rasterized output of a job, [`OutputKind`]
//! names the files a recipe step writes, and [`ConversionOutcome`] is the
//! record every step hands back to the orchestrator.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Smallest accepted scale factor.
pub const MIN_SCALE_FACTOR: u32 = 1;
/// Largest accepted scale factor.
pub const MAX_SCALE_FACTOR: u32 = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScaleError {
    #[error("scale factor must be between 1 and 10, got {0}")]
    OutOfRange(u32),
}

/// Resolution policy for one export job.
///
/// - `factor`: uniform multiplier, 1–10.
/// - `force_square`: render every raster output as a `square_size × factor`
///   square, ignoring the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScalePolicy {
    factor: u32,
    force_square: bool,
}

impl ScalePolicy {
    pub fn new(factor: u32, force_square: bool) -> Result<Self, ScaleError> {
        if !(MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR).contains(&factor) {
            return Err(ScaleError::OutOfRange(factor));
        }
        Ok(Self {
            factor,
            force_square,
        })
    }

    pub fn factor(self) -> u32 {
        self.factor
    }

    pub fn force_square(self) -> bool {
        self.force_square
    }
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self {
            factor: 1,
            force_square: false,
        }
    }
}

/// File type written by a recipe step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Png,
    Jpg,
    Eps,
    Svg,
    Zip,
}

impl OutputKind {
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Png => "png",
            OutputKind::Jpg => "jpg",
            OutputKind::Eps => "eps",
            OutputKind::Svg => "svg",
            OutputKind::Zip => "zip",
        }
    }

    /// `<dir>/<base>.<ext>`
    pub fn output_path(self, dir: &Path, base: &str) -> PathBuf {
        dir.join(format!("{}.{}", base, self.extension()))
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

/// Result of executing one format step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutcome {
    pub output_path: PathBuf,
    pub succeeded: bool,
    pub used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ConversionOutcome {
    pub fn success(output_path: PathBuf) -> Self {
        Self {
            output_path,
            succeeded: true,
            used_fallback: false,
            error_detail: None,
        }
    }

    pub fn fallback(output_path: PathBuf) -> Self {
        Self {
            used_fallback: true,
            ..Self::success(output_path)
        }
    }

    pub fn failure(output_path: PathBuf, detail: impl Into<String>) -> Self {
        Self {
            output_path,
            succeeded: false,
            used_fallback: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// Cooperative cancellation shared between the job and its controller.
///
/// Cloning shares the flag. Checked between files and while waiting on
/// subprocesses.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
