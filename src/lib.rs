//! # Microstock Export
//!
//! Batch conversion of SVG artwork into the asset sets that microstock
//! platforms accept. One source file becomes an EPS for one platform, a
//! JPG + EPS pair for another, a zipped PNG + EPS for a third, and so on.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan      artwork/          →  [logo.svg, badge.svg]
//! 2. Export    per file × platform × recipe step
//!              ├─ render      resvg          → PNG / JPG / EPS
//!              ├─ fallback    Inkscape       → EPS, cropped SVG
//!              └─ archive     zip            → PNGTree bundles
//! 3. Report    ExportReport  →  summary, optional JSON manifest
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Finds the SVG files directly inside the input folder |
//! | [`export`] | Runs every selected platform's recipe for every file, emits progress events |
//! | [`platform`] | Platform catalog and the static recipe table |
//! | [`imaging`] | SVG sizing, resvg rendering, EPS writing, Inkscape fallback, converters |
//! | [`archive`] | Flat deflate ZIP bundling and post-bundle deletion |
//! | [`config`] | `microstock.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Shared types: `ScalePolicy`, `OutputKind`, `ConversionOutcome`, `CancelFlag` |
//! | [`output`] | CLI output formatting: pure `format_*` functions plus `print_*` wrappers |
//!
//! # Design Decisions
//!
//! ## Recipes Are Data
//!
//! What a platform receives is one row in [`platform::RECIPES`]. Converters
//! never branch on the platform, and adding a platform is adding a row.
//!
//! ## In-Process Rendering First
//!
//! PNG, JPG and EPS all come from `resvg`, so a machine without Inkscape still
//! produces every raster deliverable. Inkscape is reached only through
//! [`imaging::chain`] fallbacks: it takes over EPS when the renderer rejects a
//! file, and it is the only way to crop an SVG to its drawing. Without it a
//! cropped SVG degrades to a verbatim copy.
//!
//! ## Partial Failure
//!
//! A failed step is recorded in its [`types::ConversionOutcome`] and the job
//! moves on. Only failing to create the output directories stops a run. The
//! final [`export::ExportReport`] lists every step, successful or not.

pub mod archive;
pub mod config;
pub mod export;
pub mod imaging;
pub mod output;
pub mod platform;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
