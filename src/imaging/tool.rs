//! External vector tool (Inkscape) discovery and invocation.
//!
//! The tool is a fallback only: it exports EPS when the in-process renderer
//! fails, and it is the sole way to crop an SVG to its drawing area.
//!
//! Every run is bounded by a timeout and watches the job's [`CancelFlag`].
//! On either, the child is killed and reaped before returning.

use super::calculations::tool_export_width;
use super::params::RasterSettings;
use super::remove_stale;
use super::svg_meta::svg_dimensions;
use crate::config::ToolConfig;
use crate::types::CancelFlag;
use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Executable name looked up on `PATH`.
pub const TOOL_NAME: &str = "inkscape";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[cfg(target_os = "windows")]
const WELL_KNOWN_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Inkscape\bin\inkscape.exe",
    r"C:\Program Files\Inkscape\inkscape.exe",
];
#[cfg(target_os = "macos")]
const WELL_KNOWN_LOCATIONS: &[&str] = &["/Applications/Inkscape.app/Contents/MacOS/inkscape"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const WELL_KNOWN_LOCATIONS: &[&str] = &[
    "/usr/bin/inkscape",
    "/usr/local/bin/inkscape",
    "/snap/bin/inkscape",
];

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("inkscape not found; install it or set [tool] executable")]
    Unavailable,
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} failed ({status}): {stderr}")]
    Subprocess {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{program} timed out after {}s", .limit.as_secs())]
    Timeout { program: String, limit: Duration },
    #[error("cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ToolError {
    /// Whether a fallback chain may move on to its next tier.
    ///
    /// A cancelled tool still lets in-process tiers finish the current file.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ToolError::Io(_))
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Ordered search for the tool executable.
///
/// Order: configured executable, well-known install locations for the host
/// OS, configured search directories, then `PATH`.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    pub configured: Option<PathBuf>,
    pub well_known: Vec<PathBuf>,
    pub search_paths: Vec<PathBuf>,
    pub use_path_lookup: bool,
}

impl ToolLocator {
    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            configured: config.executable.clone(),
            well_known: WELL_KNOWN_LOCATIONS.iter().map(PathBuf::from).collect(),
            search_paths: config.search_paths.clone(),
            use_path_lookup: config.use_path_lookup,
        }
    }

    /// Candidate paths checked before `PATH`, in order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let exe = format!("{TOOL_NAME}{}", std::env::consts::EXE_SUFFIX);
        self.configured
            .iter()
            .cloned()
            .chain(self.well_known.iter().cloned())
            .chain(self.search_paths.iter().map(|dir| {
                if dir.is_file() {
                    dir.clone()
                } else {
                    dir.join(&exe)
                }
            }))
            .collect()
    }

    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(configured) = &self.configured {
            if !configured.is_file() {
                tracing::warn!(
                    path = %configured.display(),
                    "configured tool executable does not exist"
                );
            }
        }
        if let Some(found) = self.candidates().into_iter().find(|p| p.is_file()) {
            tracing::debug!(path = %found.display(), "vector tool located");
            return Some(found);
        }
        if self.use_path_lookup {
            if let Ok(found) = which::which(TOOL_NAME) {
                tracing::debug!(path = %found.display(), "vector tool found on PATH");
                return Some(found);
            }
        }
        tracing::debug!("vector tool not found");
        None
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// Arguments for a width-constrained EPS export.
pub fn eps_args(width: u32, source: &Path, output: &Path) -> Vec<OsString> {
    vec![
        format!("--export-width={width}").into(),
        "--export-type=eps".into(),
        "-o".into(),
        output.into(),
        source.into(),
    ]
}

/// Arguments for an SVG export cropped to the drawing bounds.
pub fn crop_args(source: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "--export-area-drawing".into(),
        "--export-type=svg".into(),
        "-o".into(),
        output.into(),
        source.into(),
    ]
}

/// Handle to the located tool, bound to one job's timeout and cancel flag.
#[derive(Debug, Clone)]
pub struct VectorTool {
    executable: Option<PathBuf>,
    timeout: Duration,
    cancel: CancelFlag,
}

impl VectorTool {
    pub fn new(executable: Option<PathBuf>, timeout: Duration, cancel: CancelFlag) -> Self {
        Self {
            executable,
            timeout,
            cancel,
        }
    }

    /// Resolve the executable once for a job.
    pub fn from_config(config: &ToolConfig, cancel: CancelFlag) -> Self {
        let executable = ToolLocator::from_config(config).locate();
        Self::new(executable, config.timeout(), cancel)
    }

    pub fn unavailable() -> Self {
        Self::new(None, Duration::from_secs(1), CancelFlag::new())
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    /// Export `source` as EPS at the scaled intrinsic width.
    ///
    /// When the intrinsic width is unknown the square side is used instead and
    /// a note is pushed to `log`.
    pub fn export_eps(
        &self,
        source: &Path,
        output: &Path,
        settings: &RasterSettings,
        log: &mut Vec<String>,
    ) -> Result<(), ToolError> {
        let exe = self.executable.as_deref().ok_or(ToolError::Unavailable)?;
        let intrinsic = svg_dimensions(source).width();
        let (width, substituted) =
            tool_export_width(intrinsic, settings.scale.factor(), settings.square_side());
        if substituted {
            log.push(format!(
                "  Width of {} unknown, exporting EPS at {width}px",
                file_name(source)
            ));
        }
        self.run(exe, eps_args(width, source, output), output)
    }

    /// Export `source` as SVG with the canvas shrunk to the drawing bounds.
    pub fn crop_to_content(&self, source: &Path, output: &Path) -> Result<(), ToolError> {
        let exe = self.executable.as_deref().ok_or(ToolError::Unavailable)?;
        self.run(exe, crop_args(source, output), output)
    }

    fn run(&self, exe: &Path, args: Vec<OsString>, output: &Path) -> Result<(), ToolError> {
        let program = exe.display().to_string();
        // a stale file from an earlier run must not pass the output check
        remove_stale(output)?;
        let result = Cmd::new(exe)
            .args(args)
            .timeout(self.timeout)
            .cancel(self.cancel.clone())
            .run()?;
        tracing::debug!(
            status = %result.status,
            stdout = %String::from_utf8_lossy(&result.stdout).trim(),
            "vector tool finished"
        );
        if !result.status.success() {
            return Err(ToolError::Subprocess {
                program,
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        if !output.is_file() {
            return Err(ToolError::Subprocess {
                program,
                status: result.status.to_string(),
                stderr: format!("no output written to {}", output.display()),
            });
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Captured result of a finished subprocess.
#[derive(Debug)]
struct CmdOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Command builder with a deadline and cooperative cancellation.
struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    timeout: Option<Duration>,
    cancel: Option<CancelFlag>,
}

impl Cmd {
    fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            timeout: None,
            cancel: None,
        }
    }

    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    fn cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    fn run(self) -> Result<CmdOutput, ToolError> {
        let program = self.program_name();
        tracing::debug!(
            program = %program,
            args = ?self.args,
            "running vector tool"
        );
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Err(ToolError::Cancelled);
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let started = Instant::now();

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                kill_and_reap(&mut child);
                return Err(ToolError::Cancelled);
            }
            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    kill_and_reap(&mut child);
                    tracing::warn!(program = %program, "vector tool timed out");
                    return Err(ToolError::Timeout { program, limit });
                }
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(CmdOutput {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

// Reader threads are left detached: a grandchild may still hold the pipes.
fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
