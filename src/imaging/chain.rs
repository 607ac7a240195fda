//! Ordered fallback chains.
//!
//! A chain tries each [`Tier`] in turn. It moves on only when a tier fails
//! with a recoverable error (see [`ConvertError::is_recoverable`]); anything
//! else ends the chain with that error.

use super::convert::ConvertError;
use std::path::Path;

/// One way of producing an output file.
pub trait Tier {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    fn produce(&self, output: &Path, log: &mut Vec<String>) -> Result<(), ConvertError>;
}

/// Run `tiers` in order against `output`.
///
/// Returns the index of the tier that produced the file, or the error that
/// stopped the chain.
pub fn run_chain(
    tiers: &[&dyn Tier],
    output: &Path,
    log: &mut Vec<String>,
) -> Result<usize, ConvertError> {
    let mut last_error = None;
    for (index, tier) in tiers.iter().enumerate() {
        match tier.produce(output, log) {
            Ok(()) => return Ok(index),
            Err(e) if e.is_recoverable() => {
                if let Some(next) = tiers.get(index + 1) {
                    tracing::warn!(
                        tier = tier.name(),
                        next = next.name(),
                        error = %e,
                        "falling back"
                    );
                    log.push(format!(
                        "WARNING: {} failed: {e}, falling back to {}",
                        tier.name(),
                        next.name()
                    ));
                }
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_error.unwrap_or(ConvertError::EmptyChain))
}
