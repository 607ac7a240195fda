//! Format converters: one function per recipe step that writes a file.
//!
//! Every converter takes the source SVG, the platform directory and the base
//! name, and returns a [`ConversionOutcome`]. Failures are folded into the
//! outcome rather than returned, so one failed step never stops a recipe.
//! Human-readable narration is appended to the caller's `log`.

use super::backend::{BackendError, RasterBackend};
use super::calculations::flatten_over_white;
use super::chain::{Tier, run_chain};
use super::params::{RasterSettings, RenderParams};
use super::remove_stale;
use super::tool::{ToolError, VectorTool};
use crate::types::{ConversionOutcome, OutputKind};
use image::codecs::jpeg::JpegEncoder;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("fallback chain has no tiers")]
    EmptyChain,
}

impl ConvertError {
    /// Render failures and tool problems let a chain try its next tier.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ConvertError::Backend(BackendError::Render(_)) => true,
            ConvertError::Tool(e) => e.is_recoverable(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConvertError::Tool(ToolError::Cancelled))
    }
}

/// The converters for one job: renderer, external tool and settings.
pub struct Converters<'a> {
    backend: &'a dyn RasterBackend,
    tool: &'a VectorTool,
    settings: RasterSettings,
}

impl<'a> Converters<'a> {
    pub fn new(
        backend: &'a dyn RasterBackend,
        tool: &'a VectorTool,
        settings: RasterSettings,
    ) -> Self {
        Self {
            backend,
            tool,
            settings,
        }
    }

    fn render_params(&self, source: &Path, output: PathBuf) -> RenderParams {
        RenderParams {
            source: source.to_path_buf(),
            output,
            sizing: self.settings.sizing(),
            max_dimension: self.settings.max_dimension,
        }
    }

    /// RGBA PNG, transparency preserved.
    pub fn produce_png(
        &self,
        source: &Path,
        dir: &Path,
        base: &str,
        log: &mut Vec<String>,
    ) -> ConversionOutcome {
        let output = OutputKind::Png.output_path(dir, base);
        if let Err(e) = remove_stale(&output) {
            return failed(OutputKind::Png, output, e.into(), log);
        }
        match self.backend.render_png(&self.render_params(source, output.clone())) {
            Ok(dims) => {
                log.push(format!(
                    "Created PNG (transparent, {}x{}px): {}",
                    dims.width,
                    dims.height,
                    output.display()
                ));
                ConversionOutcome::success(output)
            }
            Err(e) => failed(OutputKind::Png, output, e.into(), log),
        }
    }

    /// JPG over white, via a temporary PNG that is removed on every path.
    pub fn produce_jpg(
        &self,
        source: &Path,
        dir: &Path,
        base: &str,
        log: &mut Vec<String>,
    ) -> ConversionOutcome {
        let output = OutputKind::Jpg.output_path(dir, base);
        if let Err(e) = remove_stale(&output) {
            return failed(OutputKind::Jpg, output, e.into(), log);
        }
        match self.encode_jpg(source, dir, &output) {
            Ok((w, h)) => {
                log.push(format!("Created JPG ({w}x{h}px): {}", output.display()));
                ConversionOutcome::success(output)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&output);
                failed(OutputKind::Jpg, output, e, log)
            }
        }
    }

    fn encode_jpg(
        &self,
        source: &Path,
        dir: &Path,
        output: &Path,
    ) -> Result<(u32, u32), ConvertError> {
        let intermediate = tempfile::Builder::new()
            .prefix(".render-")
            .suffix(".png")
            .tempfile_in(dir)?;
        self.backend
            .render_png(&self.render_params(source, intermediate.path().to_path_buf()))?;

        let decoded = image::open(intermediate.path())?;
        let rgb = if decoded.color().has_alpha() {
            flatten_over_white(&decoded.to_rgba8())
        } else {
            decoded.to_rgb8()
        };

        let mut out = BufWriter::new(std::fs::File::create(output)?);
        JpegEncoder::new_with_quality(&mut out, self.settings.jpeg_quality.value())
            .encode_image(&rgb)?;
        out.flush()?;
        Ok(rgb.dimensions())
    }

    /// EPS from the in-process renderer, falling back to the external tool.
    pub fn produce_eps(
        &self,
        source: &Path,
        dir: &Path,
        base: &str,
        log: &mut Vec<String>,
    ) -> ConversionOutcome {
        let output = OutputKind::Eps.output_path(dir, base);
        if let Err(e) = remove_stale(&output) {
            return failed(OutputKind::Eps, output, e.into(), log);
        }
        let renderer = RendererEps {
            backend: self.backend,
            params: self.render_params(source, output.clone()),
        };
        let tool = ToolEps {
            tool: self.tool,
            source,
            settings: &self.settings,
        };
        match run_chain(&[&renderer, &tool], &output, log) {
            Ok(0) => {
                log.push(format!("Created EPS: {}", output.display()));
                ConversionOutcome::success(output)
            }
            Ok(_) => {
                log.push(format!("Created EPS (via Inkscape fallback): {}", output.display()));
                ConversionOutcome::fallback(output)
            }
            Err(e) => failed(OutputKind::Eps, output, e, log),
        }
    }

    /// Byte-for-byte copy of the source.
    pub fn copy_svg(
        &self,
        source: &Path,
        dir: &Path,
        base: &str,
        log: &mut Vec<String>,
    ) -> ConversionOutcome {
        let output = OutputKind::Svg.output_path(dir, base);
        if let Err(e) = remove_stale(&output) {
            return failed(OutputKind::Svg, output, e.into(), log);
        }
        let copy = VerbatimCopy { source };
        match copy.produce(&output, log) {
            Ok(()) => {
                log.push(format!("Copied SVG: {}", output.display()));
                ConversionOutcome::success(output)
            }
            Err(e) => failed(OutputKind::Svg, output, e, log),
        }
    }

    /// SVG cropped to its drawing bounds; a verbatim copy when cropping fails.
    pub fn produce_cropped_svg(
        &self,
        source: &Path,
        dir: &Path,
        base: &str,
        log: &mut Vec<String>,
    ) -> ConversionOutcome {
        let output = OutputKind::Svg.output_path(dir, base);
        if let Err(e) = remove_stale(&output) {
            return failed(OutputKind::Svg, output, e.into(), log);
        }
        let crop = ToolCrop {
            tool: self.tool,
            source,
        };
        let copy = VerbatimCopy { source };
        match run_chain(&[&crop, &copy], &output, log) {
            Ok(0) => {
                log.push(format!("Created cropped SVG using Inkscape: {}", output.display()));
                ConversionOutcome::success(output)
            }
            Ok(_) => {
                log.push(format!("WARNING: SVG copied uncropped: {}", output.display()));
                ConversionOutcome::fallback(output)
            }
            Err(e) => failed(OutputKind::Svg, output, e, log),
        }
    }
}

fn failed(
    kind: OutputKind,
    output: PathBuf,
    error: ConvertError,
    log: &mut Vec<String>,
) -> ConversionOutcome {
    tracing::warn!(output = %output.display(), error = %error, "{kind} conversion failed");
    log.push(format!("ERROR creating {kind}: {error}"));
    ConversionOutcome::failure(output, error.to_string())
}

// ============================================================================
// Tiers
// ============================================================================

struct RendererEps<'a> {
    backend: &'a dyn RasterBackend,
    params: RenderParams,
}

impl Tier for RendererEps<'_> {
    fn name(&self) -> &'static str {
        "renderer"
    }

    fn produce(&self, _output: &Path, _log: &mut Vec<String>) -> Result<(), ConvertError> {
        self.backend.render_eps(&self.params)?;
        Ok(())
    }
}

struct ToolEps<'a> {
    tool: &'a VectorTool,
    source: &'a Path,
    settings: &'a RasterSettings,
}

impl Tier for ToolEps<'_> {
    fn name(&self) -> &'static str {
        "Inkscape"
    }

    fn produce(&self, output: &Path, log: &mut Vec<String>) -> Result<(), ConvertError> {
        Ok(self.tool.export_eps(self.source, output, self.settings, log)?)
    }
}

struct ToolCrop<'a> {
    tool: &'a VectorTool,
    source: &'a Path,
}

impl Tier for ToolCrop<'_> {
    fn name(&self) -> &'static str {
        "Inkscape cropping"
    }

    fn produce(&self, output: &Path, _log: &mut Vec<String>) -> Result<(), ConvertError> {
        Ok(self.tool.crop_to_content(self.source, output)?)
    }
}

struct VerbatimCopy<'a> {
    source: &'a Path,
}

impl Tier for VerbatimCopy<'_> {
    fn name(&self) -> &'static str {
        "verbatim copy"
    }

    fn produce(&self, output: &Path, _log: &mut Vec<String>) -> Result<(), ConvertError> {
        std::fs::copy(self.source, output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::Sizing;
    use crate::test_helpers::write_logo_svg;
    use crate::types::ScalePolicy;
    use tempfile::TempDir;

    fn settings(factor: u32, square: bool) -> RasterSettings {
        RasterSettings {
            scale: ScalePolicy::new(factor, square).unwrap(),
            ..RasterSettings::default()
        }
    }

    fn fixture() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("logo.svg");
        write_logo_svg(&source);
        std::fs::create_dir(tmp.path().join("out")).unwrap();
        (tmp, source)
    }

    // =========================================================================
    // PNG
    // =========================================================================

    #[test]
    fn png_uses_planned_sizing() {
        let (tmp, source) = fixture();
        let backend = MockBackend::new();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(3, true));
        let mut log = Vec::new();

        let outcome = conv.produce_png(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(outcome.succeeded);
        assert_eq!(outcome.output_path, tmp.path().join("out/logo.png"));
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::RenderPng { sizing: Sizing::Square(3000), .. }
        ));
        assert!(log[0].starts_with("Created PNG"));
    }

    #[test]
    fn png_failure_is_recorded_not_raised() {
        let (tmp, source) = fixture();
        let backend = MockBackend::failing_all();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let outcome = conv.produce_png(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(!outcome.succeeded);
        assert!(outcome.error_detail.unwrap().contains("mock png failure"));
        assert!(log[0].starts_with("ERROR creating PNG"));
    }

    // =========================================================================
    // JPG
    // =========================================================================

    #[test]
    fn jpg_is_flattened_over_white() {
        let (tmp, source) = fixture();
        let backend = MockBackend::new();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(10, false));
        let mut log = Vec::new();

        let outcome = conv.produce_jpg(&source, &tmp.path().join("out"), "logo", &mut log);
        assert!(outcome.succeeded);

        let img = image::open(tmp.path().join("out/logo.jpg")).unwrap();
        assert!(!img.color().has_alpha());
        let rgb = img.to_rgb8();
        // mock PNG: left half transparent, right half red
        let left = rgb.get_pixel(2, 10).0;
        let right = rgb.get_pixel(37, 10).0;
        assert!(left.iter().all(|&c| c > 240), "left {left:?}");
        assert!(right[0] > 200 && right[1] < 60 && right[2] < 60, "right {right:?}");
    }

    #[test]
    fn jpg_leaves_no_intermediate_files() {
        let (tmp, source) = fixture();
        let backend = MockBackend::new();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(2, false));
        let mut log = Vec::new();

        conv.produce_jpg(&source, &tmp.path().join("out"), "logo", &mut log);

        let names: Vec<String> = std::fs::read_dir(tmp.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["logo.jpg".to_string()]);
    }

    #[test]
    fn jpg_failure_leaves_nothing_behind() {
        let (tmp, source) = fixture();
        let backend = MockBackend::failing_all();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let outcome = conv.produce_jpg(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(!outcome.succeeded);
        assert_eq!(std::fs::read_dir(tmp.path().join("out")).unwrap().count(), 0);
    }

    // =========================================================================
    // EPS
    // =========================================================================

    #[test]
    fn eps_from_renderer_is_not_a_fallback() {
        let (tmp, source) = fixture();
        let backend = MockBackend::new();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let outcome = conv.produce_eps(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(outcome.succeeded);
        assert!(!outcome.used_fallback);
        assert!(tmp.path().join("out/logo.eps").exists());
    }

    #[test]
    fn eps_without_renderer_or_tool_fails() {
        let (tmp, source) = fixture();
        let backend = MockBackend::failing_eps();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let outcome = conv.produce_eps(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(!outcome.succeeded);
        assert!(outcome.error_detail.unwrap().contains("inkscape not found"));
        assert!(log.iter().any(|l| l.contains("falling back to Inkscape")));
    }

    #[test]
    fn failed_eps_removes_earlier_output() {
        let (tmp, source) = fixture();
        let stale = tmp.path().join("out/logo.eps");
        std::fs::write(&stale, "%!PS-Adobe-3.0 EPSF-3.0 old").unwrap();
        let backend = MockBackend::failing_eps();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let outcome = conv.produce_eps(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(!outcome.succeeded);
        assert!(!stale.exists());
    }

    #[test]
    fn failed_copy_removes_earlier_output() {
        let (tmp, _source) = fixture();
        let stale = tmp.path().join("out/gone.svg");
        std::fs::write(&stale, "<svg/>").unwrap();
        let backend = MockBackend::new();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(1, false));

        let outcome = conv.copy_svg(
            &tmp.path().join("gone.svg"),
            &tmp.path().join("out"),
            "gone",
            &mut Vec::new(),
        );

        assert!(!outcome.succeeded);
        assert!(!stale.exists());
    }

    #[cfg(unix)]
    #[test]
    fn eps_falls_back_to_tool() {
        let (tmp, source) = fixture();
        let backend = MockBackend::failing_eps();
        let exe = crate::test_helpers::write_working_tool(tmp.path());
        let tool = VectorTool::new(
            Some(exe),
            std::time::Duration::from_secs(10),
            crate::types::CancelFlag::new(),
        );
        let conv = Converters::new(&backend, &tool, settings(2, false));
        let mut log = Vec::new();

        let outcome = conv.produce_eps(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(outcome.succeeded);
        assert!(outcome.used_fallback);
        let written = std::fs::read_to_string(tmp.path().join("out/logo.eps")).unwrap();
        assert!(written.contains("--export-width=400"));
        assert!(log.last().unwrap().contains("via Inkscape fallback"));
    }

    // =========================================================================
    // SVG
    // =========================================================================

    #[test]
    fn copy_svg_is_byte_identical() {
        let (tmp, source) = fixture();
        let backend = MockBackend::new();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let outcome = conv.copy_svg(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(outcome.succeeded);
        assert_eq!(
            std::fs::read(&source).unwrap(),
            std::fs::read(tmp.path().join("out/logo.svg")).unwrap()
        );
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn cropped_svg_without_tool_copies_verbatim() {
        let (tmp, source) = fixture();
        let backend = MockBackend::new();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let outcome = conv.produce_cropped_svg(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(outcome.succeeded);
        assert!(outcome.used_fallback);
        assert_eq!(
            std::fs::read(&source).unwrap(),
            std::fs::read(tmp.path().join("out/logo.svg")).unwrap()
        );
        assert!(log.iter().any(|l| l.starts_with("WARNING: SVG copied uncropped")));
    }

    #[cfg(unix)]
    #[test]
    fn cropped_svg_with_failing_tool_copies_verbatim() {
        let (tmp, source) = fixture();
        let backend = MockBackend::new();
        let exe = crate::test_helpers::write_failing_tool(tmp.path());
        let tool = VectorTool::new(
            Some(exe),
            std::time::Duration::from_secs(10),
            crate::types::CancelFlag::new(),
        );
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let outcome = conv.produce_cropped_svg(&source, &tmp.path().join("out"), "logo", &mut log);

        assert!(outcome.succeeded && outcome.used_fallback);
        assert!(log.iter().any(|l| l.contains("simulated failure")));
    }

    #[cfg(unix)]
    #[test]
    fn cancelled_crop_still_copies_verbatim() {
        use std::time::{Duration, Instant};

        let (tmp, source) = fixture();
        let backend = MockBackend::new();
        let exe = crate::test_helpers::write_sleeping_tool(tmp.path());
        let cancel = crate::types::CancelFlag::new();
        let tool = VectorTool::new(Some(exe), Duration::from_secs(60), cancel.clone());
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let trigger = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            cancel.cancel();
        });
        let started = Instant::now();
        let outcome = conv.produce_cropped_svg(&source, &tmp.path().join("out"), "logo", &mut log);
        trigger.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(outcome.succeeded && outcome.used_fallback);
        assert_eq!(
            std::fs::read(&source).unwrap(),
            std::fs::read(tmp.path().join("out/logo.svg")).unwrap()
        );
    }

    #[test]
    fn missing_source_copy_fails() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let tool = VectorTool::unavailable();
        let conv = Converters::new(&backend, &tool, settings(1, false));
        let mut log = Vec::new();

        let outcome = conv.copy_svg(&tmp.path().join("gone.svg"), tmp.path(), "gone", &mut log);
        assert!(!outcome.succeeded);
    }
}
