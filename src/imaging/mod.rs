//! SVG rendering and conversion. Pure Rust first, external tool as fallback.
//!
//! | Operation | Primary | Fallback |
//! |---|---|---|
//! | **Dimensions** | `quick-xml` root element scan | none, size is `Unknown` |
//! | **PNG** | `resvg` → RGBA PNG | none |
//! | **JPG** | `resvg` → temp PNG → flatten → `JpegEncoder` | none |
//! | **EPS** | `resvg` → Flate/ASCII85 image EPS | Inkscape `--export-type=eps` |
//! | **Cropped SVG** | Inkscape `--export-area-drawing` | verbatim copy |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for size math and compositing (unit testable)
//! - **Parameters**: Data structures describing render operations
//! - **Backend**: [`RasterBackend`] trait + [`ResvgBackend`]
//! - **Tool**: [`VectorTool`] discovery and subprocess control
//! - **Convert**: [`Converters`], one method per recipe step, built on fallback chains

pub mod backend;
mod calculations;
pub mod chain;
pub mod convert;
mod eps;
mod params;
pub mod resvg_backend;
pub mod svg_meta;
pub mod tool;

pub use backend::{BackendError, Dimensions, RasterBackend};
pub use calculations::{flatten_over_white, render_size, tool_export_width};
pub use convert::{ConvertError, Converters};
pub use params::{Quality, RasterSettings, RenderParams, Sizing};
pub use resvg_backend::ResvgBackend;
pub use svg_meta::{SvgSize, svg_dimensions};
pub use tool::{ToolError, ToolLocator, VectorTool};

use std::io;
use std::path::Path;

/// Remove an output left by an earlier run. A missing file is fine.
pub(crate) fn remove_stale(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
