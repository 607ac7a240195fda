//! Rasterizer backend trait and shared types.
//!
//! The [`RasterBackend`] trait defines the two operations every backend must
//! support: render to PNG and render to EPS. Both take the same
//! [`RenderParams`], so PNG, JPG and EPS outputs of one source agree on size.
//!
//! The production implementation is
//! [`ResvgBackend`](super::resvg_backend::ResvgBackend): pure Rust, statically
//! linked. The external vector tool is not a backend. It lives in
//! [`tool`](super::tool) and is only reached through fallback chains.

use super::params::RenderParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("render failed: {0}")]
    Render(String),
}

/// Pixel size of a rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for in-process rasterizers.
///
/// Implementations must write the output file only on success. A failed
/// render may leave nothing behind, never a truncated file.
pub trait RasterBackend: Sync {
    /// Render `params.source` to a PNG with an alpha channel.
    fn render_png(&self, params: &RenderParams) -> Result<Dimensions, BackendError>;

    /// Render `params.source` to an Encapsulated PostScript file.
    fn render_eps(&self, params: &RenderParams) -> Result<Dimensions, BackendError>;
}
