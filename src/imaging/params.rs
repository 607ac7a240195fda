//! Parameter types for render operations.
//!
//! These structs describe *what* to render, not *how*. They are the interface
//! between the converters (which decide what files to create) and the
//! [`backend`](super::backend) (which does the pixel work), so a mock backend
//! can stand in during tests.

use crate::config::RasterConfig;
use crate::types::ScalePolicy;
use std::path::PathBuf;

/// JPEG encoding quality (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// How the output size is derived from the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Fixed square output, side length in pixels.
    Square(u32),
    /// Intrinsic size multiplied by a uniform factor.
    Scale(f32),
}

/// Renderer settings shared by every conversion of a job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSettings {
    pub scale: ScalePolicy,
    /// Side length of square-mode output at 1x.
    pub square_size: u32,
    pub jpeg_quality: Quality,
    pub max_dimension: u32,
}

impl RasterSettings {
    pub fn new(scale: ScalePolicy, config: &RasterConfig) -> Self {
        Self {
            scale,
            square_size: config.square_size,
            jpeg_quality: Quality::new(config.jpeg_quality),
            max_dimension: config.max_dimension,
        }
    }

    /// `square_size × factor`: the square side, and the fallback export width.
    pub fn square_side(&self) -> u32 {
        self.square_size.saturating_mul(self.scale.factor())
    }

    pub fn sizing(&self) -> Sizing {
        if self.scale.force_square() {
            Sizing::Square(self.square_side())
        } else {
            Sizing::Scale(self.scale.factor() as f32)
        }
    }
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self::new(ScalePolicy::default(), &RasterConfig::default())
    }
}

/// Everything one render needs: source, output, size policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub sizing: Sizing,
    pub max_dimension: u32,
}
