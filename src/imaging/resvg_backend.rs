//! Pure Rust rasterizer built on `resvg`.
//!
//! | Operation | Implementation |
//! |---|---|
//! | **Parse** | `usvg::Tree::from_data`, relative hrefs resolved from the SVG's directory |
//! | **Render** | `tiny_skia::Pixmap` + `resvg::render` with a scale transform |
//! | **PNG** | demultiplied RGBA8 via `image::RgbaImage::save` |
//! | **EPS** | pixmap rows streamed through [`write_eps`](super::eps::write_eps) |
//!
//! System fonts are loaded once per backend and shared across renders.

use super::backend::{BackendError, Dimensions, RasterBackend};
use super::calculations::render_size;
use super::eps::write_eps;
use super::params::RenderParams;
use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use std::io::{BufWriter, Write};
use std::sync::Arc;

pub struct ResvgBackend {
    fontdb: Arc<fontdb::Database>,
}

impl ResvgBackend {
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self {
            fontdb: Arc::new(db),
        }
    }

    fn parse(&self, params: &RenderParams) -> Result<usvg::Tree, BackendError> {
        let data = std::fs::read(&params.source)?;
        let options = usvg::Options {
            resources_dir: params.source.parent().map(|p| p.to_path_buf()),
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        usvg::Tree::from_data(&data, &options).map_err(|e| {
            BackendError::Render(format!("cannot parse {}: {e}", params.source.display()))
        })
    }

    fn rasterize(&self, params: &RenderParams) -> Result<Pixmap, BackendError> {
        let tree = self.parse(params)?;
        let size = tree.size();
        let (width, height) = render_size((size.width(), size.height()), params.sizing);
        if width > params.max_dimension || height > params.max_dimension {
            return Err(BackendError::Render(format!(
                "output size {width}x{height} exceeds the {max}px limit",
                max = params.max_dimension
            )));
        }

        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            BackendError::Render(format!("cannot allocate {width}x{height} pixmap"))
        })?;
        let sx = width as f32 / size.width();
        let sy = height as f32 / size.height();
        tracing::debug!(width, height, source = %params.source.display(), "rendering");
        resvg::render(&tree, Transform::from_scale(sx, sy), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

/// Straight-alpha copy of a premultiplied pixmap.
fn demultiplied(pixmap: &Pixmap) -> Result<RgbaImage, BackendError> {
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba)
        .ok_or_else(|| BackendError::Render("pixel buffer size mismatch".into()))
}

impl Default for ResvgBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend for ResvgBackend {
    fn render_png(&self, params: &RenderParams) -> Result<Dimensions, BackendError> {
        let img = demultiplied(&self.rasterize(params)?)?;
        img.save_with_format(&params.output, image::ImageFormat::Png)
            .map_err(|e| BackendError::Render(format!("PNG encode failed: {e}")))?;
        Ok(Dimensions {
            width: img.width(),
            height: img.height(),
        })
    }

    fn render_eps(&self, params: &RenderParams) -> Result<Dimensions, BackendError> {
        let pixmap = self.rasterize(params)?;
        let (width, height) = (pixmap.width(), pixmap.height());
        let file = std::fs::File::create(&params.output)?;
        let mut out = BufWriter::new(file);
        if let Err(e) = write_eps(width, height, pixmap.data(), &mut out).and_then(|()| out.flush())
        {
            drop(out);
            let _ = std::fs::remove_file(&params.output);
            return Err(e.into());
        }
        Ok(Dimensions { width, height })
    }
}
