//! Export orchestration: every selected platform's recipe for every source.
//!
//! ## Output Structure
//!
//! ```text
//! Microstock_Ready/
//! ├── Shutterstock/
//! │   └── logo.eps
//! ├── PNGTree/
//! │   └── logo.zip          # logo.png + logo.eps, loose files removed
//! ├── AdobeStock/
//! │   └── logo.svg          # verbatim copy
//! └── ...
//! ```
//!
//! Files and steps run sequentially on the calling thread. Step failures are
//! recorded in the [`ExportReport`] and never stop the job; only failing to
//! create the output directories does. Cancellation is checked between files.

use crate::archive;
use crate::config::ExportConfig;
use crate::imaging::{Converters, RasterBackend, RasterSettings, ResvgBackend, VectorTool};
use crate::platform::{FormatStep, Platform};
use crate::types::{CancelFlag, ConversionOutcome, OutputKind, ScalePolicy};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot create output root {}: {source}", path.display())]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot create platform directory {}: {source}", path.display())]
    PlatformDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no platforms selected")]
    NoPlatforms,
}

/// One run: sources in caller order, target platforms, scale and output root.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub sources: Vec<PathBuf>,
    pub platforms: Vec<Platform>,
    pub scale: ScalePolicy,
    pub output_root: PathBuf,
}

/// Narration sent to the caller while a job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    Progress { percent: u8, message: String },
    Log { message: String },
}

/// The outcome of one recipe step for one source.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub source: PathBuf,
    pub platform: Platform,
    pub step: &'static str,
    pub kind: OutputKind,
    #[serde(flatten)]
    pub outcome: ConversionOutcome,
}

/// Full manifest of a finished (or cancelled) job.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub output_root: PathBuf,
    pub platforms: Vec<Platform>,
    pub scale: ScalePolicy,
    pub files_total: usize,
    pub files_processed: usize,
    pub cancelled: bool,
    pub records: Vec<StepRecord>,
}

impl ExportReport {
    /// Every step succeeded and the job ran to the end.
    pub fn succeeded(&self) -> bool {
        !self.cancelled && self.records.iter().all(|r| r.outcome.succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(|r| !r.outcome.succeeded)
    }

    pub fn fallback_count(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.used_fallback).count()
    }
}

struct Events(Option<Sender<ExportEvent>>);

impl Events {
    fn send(&self, event: ExportEvent) {
        if let Some(tx) = &self.0 {
            // a dropped receiver only means nobody is listening
            let _ = tx.send(event);
        }
    }

    fn progress(&self, percent: u8, message: impl Into<String>) {
        self.send(ExportEvent::Progress {
            percent,
            message: message.into(),
        });
    }

    fn log(&self, message: impl Into<String>) {
        self.send(ExportEvent::Log {
            message: message.into(),
        });
    }
}

/// Run `job` with the production renderer and the configured external tool.
pub fn run(
    job: &ExportJob,
    config: &ExportConfig,
    events: Option<Sender<ExportEvent>>,
    cancel: &CancelFlag,
) -> Result<ExportReport, ExportError> {
    let backend = ResvgBackend::new();
    let tool = VectorTool::from_config(&config.tool, cancel.clone());
    let settings = RasterSettings::new(job.scale, &config.raster);
    run_with(&backend, &tool, job, settings, events, cancel)
}

/// Run `job` with an injected renderer and tool.
pub fn run_with(
    backend: &dyn RasterBackend,
    tool: &VectorTool,
    job: &ExportJob,
    settings: RasterSettings,
    events: Option<Sender<ExportEvent>>,
    cancel: &CancelFlag,
) -> Result<ExportReport, ExportError> {
    let events = Events(events);
    let platforms = Platform::normalize(&job.platforms);
    if platforms.is_empty() {
        return Err(ExportError::NoPlatforms);
    }
    let dirs = prepare_dirs(&job.output_root, &platforms, &events)?;

    let converters = Converters::new(backend, tool, settings);
    let total = job.sources.len();
    let mut report = ExportReport {
        output_root: job.output_root.clone(),
        platforms: platforms.clone(),
        scale: job.scale,
        files_total: total,
        files_processed: 0,
        cancelled: false,
        records: Vec::new(),
    };

    for (index, source) in job.sources.iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            events.log("Conversion stopped by user");
            break;
        }
        let name = display_name(source);
        events.progress(
            percent(index, total),
            format!("[{}/{}] Processing {name}", index + 1, total),
        );
        events.log(format!("Processing: {name}"));
        tracing::debug!(source = %source.display(), "processing");

        let base = base_name(source);
        for (platform, dir) in platforms.iter().zip(&dirs) {
            for &step in platform.recipe().steps {
                let mut log = Vec::new();
                let outcome = execute_step(&converters, step, source, dir, &base, &mut log);
                for line in log {
                    events.log(line);
                }
                report.records.push(StepRecord {
                    source: source.clone(),
                    platform: *platform,
                    step: step.label(),
                    kind: step.output_kind(),
                    outcome,
                });
            }
        }
        report.files_processed += 1;
    }

    if !report.cancelled {
        events.progress(100, "Conversion completed!");
    }
    Ok(report)
}

/// Create the output root and one directory per platform, in platform order.
fn prepare_dirs(
    root: &Path,
    platforms: &[Platform],
    events: &Events,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(root).map_err(|source| ExportError::OutputRoot {
        path: root.to_path_buf(),
        source,
    })?;
    platforms
        .iter()
        .map(|platform| {
            let dir = root.join(platform.display_name());
            std::fs::create_dir_all(&dir).map_err(|source| ExportError::PlatformDir {
                path: dir.clone(),
                source,
            })?;
            events.log(format!("Output directory: {}", dir.display()));
            Ok(dir)
        })
        .collect()
}

fn execute_step(
    converters: &Converters<'_>,
    step: FormatStep,
    source: &Path,
    dir: &Path,
    base: &str,
    log: &mut Vec<String>,
) -> ConversionOutcome {
    match step {
        FormatStep::ProducePng => converters.produce_png(source, dir, base, log),
        FormatStep::ProduceJpg => converters.produce_jpg(source, dir, base, log),
        FormatStep::ProduceEps => converters.produce_eps(source, dir, base, log),
        FormatStep::CopySvg => converters.copy_svg(source, dir, base, log),
        FormatStep::ProduceCroppedSvg => converters.produce_cropped_svg(source, dir, base, log),
        FormatStep::ArchiveAndDelete(kinds) => {
            let inputs: Vec<PathBuf> = kinds.iter().map(|k| k.output_path(dir, base)).collect();
            let outcome = archive::bundle(&inputs, &OutputKind::Zip.output_path(dir, base), log);
            if outcome.succeeded {
                archive::delete_files(&inputs, log);
            }
            outcome
        }
    }
}

fn percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (index * 100 / total).min(100) as u8
}

/// File name without its extension.
pub fn base_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

fn display_name(source: &Path) -> String {
    source
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}
