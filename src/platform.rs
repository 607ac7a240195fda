//! Platform catalog and recipe registry.
//!
//! Each supported publishing platform maps to exactly one [`Recipe`]: an
//! ordered list of [`FormatStep`]s. The table in [`RECIPES`] is the only place
//! that knows what a platform needs; converters never branch on platform.
//!
//! | Platform | Directory | Steps |
//! |---|---|---|
//! | shutterstock | `Shutterstock` | EPS |
//! | vectorstock | `Vectorstock` | EPS, JPG |
//! | pngtree | `PNGTree` | PNG, EPS, ZIP(PNG + EPS) then delete PNG + EPS |
//! | dreamstime | `Dreamstime` | JPG, EPS |
//! | adobestock | `AdobeStock` | SVG (verbatim) |
//! | canva | `Canva` | PNG |
//! | miricanvas | `MiriCanvas` | SVG (cropped to content) |
//! | desainstock | `Desainstock` | JPG |

use crate::types::OutputKind;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown platform '{0}' (expected one of: {list})", list = Platform::ids().join(", "))]
pub struct UnknownPlatform(pub String);

/// A publishing destination. Declaration order is catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Shutterstock,
    Vectorstock,
    Pngtree,
    Dreamstime,
    Adobestock,
    Canva,
    Miricanvas,
    Desainstock,
}

impl Platform {
    pub const ALL: [Platform; 8] = [
        Platform::Shutterstock,
        Platform::Vectorstock,
        Platform::Pngtree,
        Platform::Dreamstime,
        Platform::Adobestock,
        Platform::Canva,
        Platform::Miricanvas,
        Platform::Desainstock,
    ];

    /// Lowercase identifier used on the command line and in reports.
    pub fn id(self) -> &'static str {
        match self {
            Platform::Shutterstock => "shutterstock",
            Platform::Vectorstock => "vectorstock",
            Platform::Pngtree => "pngtree",
            Platform::Dreamstime => "dreamstime",
            Platform::Adobestock => "adobestock",
            Platform::Canva => "canva",
            Platform::Miricanvas => "miricanvas",
            Platform::Desainstock => "desainstock",
        }
    }

    /// Name of the platform's directory under the output root.
    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Shutterstock => "Shutterstock",
            Platform::Vectorstock => "Vectorstock",
            Platform::Pngtree => "PNGTree",
            Platform::Dreamstime => "Dreamstime",
            Platform::Adobestock => "AdobeStock",
            Platform::Canva => "Canva",
            Platform::Miricanvas => "MiriCanvas",
            Platform::Desainstock => "Desainstock",
        }
    }

    /// Human label listing what the platform receives.
    pub fn label(self) -> &'static str {
        match self {
            Platform::Shutterstock => "Shutterstock (EPS)",
            Platform::Vectorstock => "Vectorstock (JPG + EPS)",
            Platform::Pngtree => "PNGTree (PNG + EPS Zipped)",
            Platform::Dreamstime => "Dreamstime (JPG + EPS)",
            Platform::Adobestock => "AdobeStock (SVG)",
            Platform::Canva => "Canva (PNG)",
            Platform::Miricanvas => "MiriCanvas (SVG Cropped)",
            Platform::Desainstock => "Desainstock (JPG)",
        }
    }

    pub fn recipe(self) -> &'static Recipe {
        // RECIPES is declared in catalog order
        &RECIPES[self as usize]
    }

    pub fn ids() -> Vec<&'static str> {
        Self::ALL.iter().map(|p| p.id()).collect()
    }

    /// Sort into catalog order and drop duplicates.
    pub fn normalize(selection: &[Platform]) -> Vec<Platform> {
        let mut platforms = selection.to_vec();
        platforms.sort();
        platforms.dedup();
        platforms
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| {
                p.id().eq_ignore_ascii_case(wanted) || p.display_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// One unit of work in a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStep {
    ProducePng,
    ProduceJpg,
    ProduceEps,
    CopySvg,
    ProduceCroppedSvg,
    /// Bundle the listed outputs of earlier steps, then delete them.
    ArchiveAndDelete(&'static [OutputKind]),
}

impl FormatStep {
    /// File type this step writes.
    pub fn output_kind(self) -> OutputKind {
        match self {
            FormatStep::ProducePng => OutputKind::Png,
            FormatStep::ProduceJpg => OutputKind::Jpg,
            FormatStep::ProduceEps => OutputKind::Eps,
            FormatStep::CopySvg | FormatStep::ProduceCroppedSvg => OutputKind::Svg,
            FormatStep::ArchiveAndDelete(_) => OutputKind::Zip,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormatStep::ProducePng => "PNG",
            FormatStep::ProduceJpg => "JPG",
            FormatStep::ProduceEps => "EPS",
            FormatStep::CopySvg => "SVG",
            FormatStep::ProduceCroppedSvg => "SVG (cropped)",
            FormatStep::ArchiveAndDelete(_) => "ZIP",
        }
    }
}

/// Ordered steps for one platform.
#[derive(Debug, PartialEq, Eq)]
pub struct Recipe {
    pub platform: Platform,
    pub steps: &'static [FormatStep],
}

impl Recipe {
    /// Files left in the platform directory after the recipe succeeds.
    ///
    /// Archived outputs are removed after bundling, so they are not listed.
    pub fn final_outputs(&self) -> Vec<OutputKind> {
        let mut kinds: Vec<OutputKind> = Vec::new();
        for step in self.steps {
            if let FormatStep::ArchiveAndDelete(bundled) = step {
                kinds.retain(|k| !bundled.contains(k));
            }
            let kind = step.output_kind();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }
}

pub static RECIPES: [Recipe; 8] = [
    Recipe {
        platform: Platform::Shutterstock,
        steps: &[FormatStep::ProduceEps],
    },
    Recipe {
        platform: Platform::Vectorstock,
        steps: &[FormatStep::ProduceEps, FormatStep::ProduceJpg],
    },
    Recipe {
        platform: Platform::Pngtree,
        steps: &[
            FormatStep::ProducePng,
            FormatStep::ProduceEps,
            FormatStep::ArchiveAndDelete(&[OutputKind::Png, OutputKind::Eps]),
        ],
    },
    Recipe {
        platform: Platform::Dreamstime,
        steps: &[FormatStep::ProduceJpg, FormatStep::ProduceEps],
    },
    Recipe {
        platform: Platform::Adobestock,
        steps: &[FormatStep::CopySvg],
    },
    Recipe {
        platform: Platform::Canva,
        steps: &[FormatStep::ProducePng],
    },
    Recipe {
        platform: Platform::Miricanvas,
        steps: &[FormatStep::ProduceCroppedSvg],
    },
    Recipe {
        platform: Platform::Desainstock,
        steps: &[FormatStep::ProduceJpg],
    },
];
