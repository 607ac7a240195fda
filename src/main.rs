use clap::{Parser, Subcommand};
use microstock_export::export::{self, ExportJob};
use microstock_export::imaging::{ToolLocator, svg_dimensions};
use microstock_export::platform::Platform;
use microstock_export::types::{CancelFlag, MAX_SCALE_FACTOR, MIN_SCALE_FACTOR, ScalePolicy};
use microstock_export::{config, output, scan};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Flags shared by commands that read an input folder.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Folder containing the SVG files
    input: PathBuf,

    /// Config file (default: microstock.toml in the input folder)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl InputArgs {
    fn load_config(&self) -> Result<config::ExportConfig, config::ConfigError> {
        match &self.config {
            Some(path) => config::load_config_file(path),
            None => config::load_config(&self.input),
        }
    }
}

#[derive(clap::Args)]
struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Target platform id or name; repeat or comma-separate for several
    #[arg(short, long = "platform", value_name = "PLATFORM", value_delimiter = ',')]
    platforms: Vec<Platform>,

    /// Export for every platform
    #[arg(long, conflicts_with = "platforms")]
    all: bool,

    /// Resolution multiplier for raster outputs
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32)
            .range(MIN_SCALE_FACTOR as i64..=MAX_SCALE_FACTOR as i64)
    )]
    scale: u32,

    /// Force square 1:1 raster outputs regardless of aspect ratio
    #[arg(long)]
    square: bool,

    /// Output root (default: <INPUT>/Microstock_Ready)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the full outcome manifest as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "microstock-export")]
#[command(about = "Convert SVG artwork into microstock-ready asset sets")]
#[command(long_about = "\
Convert SVG artwork into microstock-ready asset sets

Every SVG directly inside the input folder is exported once per selected
platform, into one directory per platform:

  artwork/
  ├── logo.svg
  ├── microstock.toml              # Optional config
  └── Microstock_Ready/
      ├── Shutterstock/logo.eps
      ├── Vectorstock/logo.eps, logo.jpg
      ├── PNGTree/logo.zip         # PNG + EPS
      ├── Dreamstime/logo.jpg, logo.eps
      ├── AdobeStock/logo.svg      # Verbatim copy
      ├── Canva/logo.png           # Transparent
      ├── MiriCanvas/logo.svg      # Cropped to content
      └── Desainstock/logo.jpg

Rendering is done in-process. Inkscape, when installed, is used as the EPS
fallback and for cropping; without it cropped SVGs are copied verbatim.

Run 'microstock-export platforms' to list platform ids.
Run 'microstock-export gen-config' to generate a documented microstock.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export every SVG in a folder for the selected platforms
    Export(ExportArgs),
    /// List supported platforms and what each receives
    Platforms,
    /// Show discovered SVGs, their sizes and the resolved vector tool
    Check(InputArgs),
    /// Print a stock microstock.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Command::Export(args) => {
            if !run_export(args)? {
                std::process::exit(1);
            }
        }
        Command::Platforms => output::print_platforms(),
        Command::Check(args) => {
            let config = args.load_config()?;
            println!("==> Checking {}", args.input.display());
            let inputs: Vec<_> = scan::discover_svgs(&args.input)?
                .into_iter()
                .map(|path| {
                    let size = svg_dimensions(&path);
                    (path, size)
                })
                .collect();
            let tool = ToolLocator::from_config(&config.tool).locate();
            output::print_check(&inputs, tool.as_deref());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Returns whether every step succeeded.
fn run_export(args: ExportArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let config = args.input.load_config()?;
    let platforms = if args.all {
        Platform::ALL.to_vec()
    } else {
        args.platforms
    };
    if platforms.is_empty() {
        return Err("select at least one platform with --platform or --all".into());
    }
    let scale = ScalePolicy::new(args.scale, args.square)?;

    let input = args.input.input;
    let sources = scan::discover_svgs(&input)?;
    if sources.is_empty() {
        println!("WARNING: No SVG files found in {}", input.display());
        return Ok(true);
    }

    let job = ExportJob {
        sources,
        platforms,
        scale,
        output_root: args
            .output
            .unwrap_or_else(|| config.output.default_root(&input)),
    };
    output::print_job_header(&job);

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())?;
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let report = std::thread::scope(|s| {
        let worker = s.spawn(|| export::run(&job, &config, Some(tx), &cancel));
        for event in rx {
            for line in output::format_export_event(&event) {
                println!("{}", line);
            }
        }
        worker.join()
    })
    .map_err(|_| "export worker panicked")??;

    output::print_report(&report);
    if let Some(path) = &args.report {
        write_report(path, &report)?;
        println!("Report: {}", path.display());
    }
    Ok(report.succeeded())
}

fn write_report(
    path: &Path,
    report: &export::ExportReport,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}
