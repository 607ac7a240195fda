//! Export configuration.
//!
//! Handles loading, validating, and merging `microstock.toml`. Stock defaults
//! are overridden by a `microstock.toml` in the input folder, or by an explicit
//! file passed with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [raster]
//! square_size = 1000       # Side length (px) of square-mode output at 1x
//! jpeg_quality = 95        # JPEG encoding quality (1-100)
//! max_dimension = 16384    # Largest rendered side the library renderer accepts
//!
//! [tool]
//! # executable = "/opt/inkscape/bin/inkscape"
//! search_paths = []        # Extra locations checked before PATH
//! use_path_lookup = true   # Fall back to searching PATH for `inkscape`
//! timeout_secs = 120       # Kill the external tool after this long
//!
//! [output]
//! dir_name = "Microstock_Ready"  # Output folder created inside the input folder
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the input folder.
pub const CONFIG_FILENAME: &str = "microstock.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Export configuration loaded from `microstock.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Resolution and encoding settings for the library renderer.
    pub raster: RasterConfig,
    /// External vector tool discovery and invocation.
    pub tool: ToolConfig,
    /// Output folder naming.
    pub output: OutputConfig,
}

impl ExportConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.raster.square_size == 0 {
            return Err(ConfigError::Validation(
                "raster.square_size must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.raster.jpeg_quality) {
            return Err(ConfigError::Validation(
                "raster.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.raster.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "raster.max_dimension must be non-zero".into(),
            ));
        }
        if self.tool.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "tool.timeout_secs must be non-zero".into(),
            ));
        }
        if self.output.dir_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.dir_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Library renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RasterConfig {
    /// Side length of square-mode output at 1x. Also the width the external
    /// tool falls back to when an SVG's intrinsic width cannot be read.
    pub square_size: u32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Largest width or height the library renderer will allocate.
    pub max_dimension: u32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            square_size: 1000,
            jpeg_quality: 95,
            max_dimension: 16_384,
        }
    }
}

/// External vector tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Explicit executable path. Checked before any other location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    /// Additional candidate paths, checked after the built-in install locations.
    pub search_paths: Vec<PathBuf>,
    /// Search `PATH` when no candidate exists.
    pub use_path_lookup: bool,
    /// Upper bound for a single invocation.
    pub timeout_secs: u64,
}

impl ToolConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable: None,
            search_paths: Vec::new(),
            use_path_lookup: true,
            timeout_secs: 120,
        }
    }
}

/// Output folder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Folder created inside the input folder when `--output` is not given.
    pub dir_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir_name: "Microstock_Ready".to_string(),
        }
    }
}

impl OutputConfig {
    /// Default output root for an input folder.
    pub fn default_root(&self, input_dir: &Path) -> PathBuf {
        input_dir.join(&self.dir_name)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ExportConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a TOML file as a raw value. `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ExportConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ExportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `microstock.toml` from the input folder, if present.
pub fn load_config(input_dir: &Path) -> Result<ExportConfig, ConfigError> {
    resolve_config(load_raw_config(&input_dir.join(CONFIG_FILENAME))?)
}

/// Load an explicitly named config file. A missing file is an error here.
pub fn load_config_file(path: &Path) -> Result<ExportConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `microstock.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Microstock Export Configuration
# ===============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as `microstock.toml` in the folder holding your SVG files,
# or pass it explicitly with `--config`.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[raster]
# Side length in pixels of square-mode (--square) output at 1x.
# At --scale 3 a square export is 3000x3000. Also used as the export width
# for the Inkscape fallback when an SVG has no readable width.
square_size = 1000

# JPEG quality (1 = worst, 100 = best).
jpeg_quality = 95

# Largest width or height the built-in renderer will produce. Larger EPS
# exports are handed to Inkscape instead.
max_dimension = 16384

# ---------------------------------------------------------------------------
# Inkscape (EPS fallback and canvas cropping)
# ---------------------------------------------------------------------------
[tool]
# Explicit path to the inkscape executable. Leave unset to auto-detect.
# executable = "/opt/inkscape/bin/inkscape"

# Extra locations to check after the standard install paths.
search_paths = []

# Search PATH for `inkscape` when nothing else is found.
use_path_lookup = true

# Seconds before a single Inkscape run is killed.
timeout_secs = 120

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Folder created inside the input folder when --output is not given.
dir_name = "Microstock_Ready"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ExportConfig::default();
        assert_eq!(config.raster.square_size, 1000);
        assert_eq!(config.raster.jpeg_quality, 95);
        assert_eq!(config.raster.max_dimension, 16_384);
        assert_eq!(config.tool.executable, None);
        assert!(config.tool.use_path_lookup);
        assert_eq!(config.tool.timeout(), Duration::from_secs(120));
        assert_eq!(config.output.dir_name, "Microstock_Ready");
    }

    #[test]
    fn default_root_is_inside_input_folder() {
        let output = OutputConfig::default();
        assert_eq!(
            output.default_root(Path::new("/art/batch-1")),
            PathBuf::from("/art/batch-1/Microstock_Ready")
        );
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[raster]
square_size = 2000
"#;
        let config: ExportConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.raster.square_size, 2000);
        assert_eq!(config.raster.jpeg_quality, 95);
        assert_eq!(config.tool.timeout_secs, 120);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = r#"
[raster]
square = 2000
"#;
        let result: Result<ExportConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_zero_square_size() {
        let mut config = ExportConfig::default();
        config.raster.square_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("square_size")
        ));
    }

    #[test]
    fn validate_rejects_bad_quality() {
        let mut config = ExportConfig::default();
        config.raster.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.raster.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = ExportConfig::default();
        config.tool.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_overlay_keeps_unrelated_defaults() {
        let overlay: toml::Value = toml::from_str(
            r#"
[tool]
executable = "/opt/inkscape"
"#,
        )
        .unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.tool.executable, Some(PathBuf::from("/opt/inkscape")));
        assert!(config.tool.use_path_lookup);
        assert_eq!(config.raster.square_size, 1000);
    }

    #[test]
    fn merge_toml_replaces_scalars_and_merges_tables() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("a = 5\n[t]\ny = 9\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(5));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(9));
    }

    #[test]
    fn load_config_without_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.raster.square_size, 1000);
    }

    #[test]
    fn load_config_reads_microstock_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[output]\ndir_name = \"Ready\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.output.dir_name, "Ready");
    }

    #[test]
    fn load_config_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[raster\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_file_missing_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_config_file(&tmp.path().join("nope.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: ExportConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = ExportConfig::default();
        assert_eq!(config.raster.square_size, defaults.raster.square_size);
        assert_eq!(config.raster.jpeg_quality, defaults.raster.jpeg_quality);
        assert_eq!(config.tool.timeout_secs, defaults.tool.timeout_secs);
        assert_eq!(config.output.dir_name, defaults.output.dir_name);
    }
}
