//! Intrinsic size of an SVG document, read from the root element.
//!
//! Resolution order:
//!
//! 1. `width` and `height` attributes, leading number only (`"210mm"` → 210)
//! 2. `viewBox` third and fourth values
//! 3. [`SvgSize::Unknown`]
//!
//! An unknown size is not an error. Callers substitute a policy default.
//! Malformed documents are reported through `tracing` and yield `Unknown`.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Outcome of a dimension lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum SvgSize {
    Known { width: f64, height: f64 },
    Unknown { reason: String },
}

impl SvgSize {
    fn unknown(reason: impl Into<String>) -> Self {
        SvgSize::Unknown {
            reason: reason.into(),
        }
    }

    pub fn width(&self) -> Option<f64> {
        match self {
            SvgSize::Known { width, .. } => Some(*width),
            SvgSize::Unknown { .. } => None,
        }
    }

    pub fn known(&self) -> Option<(f64, f64)> {
        match self {
            SvgSize::Known { width, height } => Some((*width, *height)),
            SvgSize::Unknown { .. } => None,
        }
    }
}

/// Read the intrinsic size of the SVG at `path`.
pub fn svg_dimensions(path: &Path) -> SvgSize {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read SVG");
            return SvgSize::unknown(format!("could not read {}: {e}", path.display()));
        }
    };
    let size = parse_svg_dimensions(&text);
    if let SvgSize::Unknown { reason } = &size {
        tracing::warn!(path = %path.display(), %reason, "SVG dimensions unknown");
    }
    size
}

/// Parse the intrinsic size from SVG source text.
pub fn parse_svg_dimensions(text: &str) -> SvgSize {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => return root_dimensions(&e),
            Ok(Event::Eof) => return SvgSize::unknown("document has no root element"),
            Err(e) => {
                return SvgSize::unknown(format!(
                    "malformed XML at byte {}: {e}",
                    reader.buffer_position()
                ));
            }
            // declaration, comments, doctype, processing instructions
            Ok(_) => {}
        }
    }
}

fn root_dimensions(root: &BytesStart<'_>) -> SvgSize {
    if root.local_name().as_ref() != b"svg" {
        let name = String::from_utf8_lossy(root.local_name().as_ref()).into_owned();
        return SvgSize::unknown(format!("root element is <{name}>, not <svg>"));
    }

    let mut width = None;
    let mut height = None;
    let mut view_box = None;
    for attr in root.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(e) => return SvgSize::unknown(format!("malformed attribute: {e}")),
        };
        let Ok(value) = std::str::from_utf8(&attr.value) else {
            continue;
        };
        match attr.key.local_name().as_ref() {
            b"width" => width = leading_number(value),
            b"height" => height = leading_number(value),
            b"viewBox" => view_box = parse_view_box(value),
            _ => {}
        }
    }

    match (width, height, view_box) {
        (Some(width), Some(height), _) => SvgSize::Known { width, height },
        (_, _, Some((width, height))) => SvgSize::Known { width, height },
        _ => SvgSize::unknown("no usable width/height or viewBox"),
    }
}

/// Leading decimal number of an attribute value, ignoring unit suffixes.
///
/// Returns `None` for missing, zero, or negative values.
pub fn leading_number(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (c == '.' && !trimmed[..i].contains('.'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
}

/// Width and height from a `viewBox="min-x min-y width height"` value.
fn parse_view_box(value: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((*w, *h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_and_height_attributes() {
        let size = parse_svg_dimensions(r#"<svg width="200" height="100"></svg>"#);
        assert_eq!(
            size,
            SvgSize::Known {
                width: 200.0,
                height: 100.0
            }
        );
    }

    #[test]
    fn unit_suffixes_are_ignored() {
        let size = parse_svg_dimensions(r#"<svg width="210mm" height="297.5mm"/>"#);
        assert_eq!(size.known(), Some((210.0, 297.5)));

        let size = parse_svg_dimensions(r#"<svg width="64px" height="48px"/>"#);
        assert_eq!(size.known(), Some((64.0, 48.0)));
    }

    #[test]
    fn falls_back_to_view_box() {
        let size = parse_svg_dimensions(r#"<svg viewBox="0 0 300 150"></svg>"#);
        assert_eq!(size.known(), Some((300.0, 150.0)));
    }

    #[test]
    fn view_box_with_commas() {
        let size = parse_svg_dimensions(r#"<svg viewBox="0,0,30.5,15"/>"#);
        assert_eq!(size.known(), Some((30.5, 15.0)));
    }

    #[test]
    fn percentage_width_without_height_uses_view_box() {
        let size =
            parse_svg_dimensions(r#"<svg width="100%" viewBox="-10 -10 400 200"></svg>"#);
        assert_eq!(size.known(), Some((400.0, 200.0)));
    }

    #[test]
    fn prolog_and_comments_are_skipped() {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- exported by an editor -->
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg" width="48" height="24"><rect/></svg>"#;
        assert_eq!(parse_svg_dimensions(text).known(), Some((48.0, 24.0)));
    }

    #[test]
    fn namespaced_root_is_accepted() {
        let text = r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg" width="10" height="20"/>"#;
        assert_eq!(parse_svg_dimensions(text).known(), Some((10.0, 20.0)));
    }

    #[test]
    fn no_size_information_is_unknown() {
        let size = parse_svg_dimensions(r#"<svg><circle r="4"/></svg>"#);
        assert!(matches!(size, SvgSize::Unknown { .. }));
        assert_eq!(size.width(), None);
    }

    #[test]
    fn non_svg_root_is_unknown() {
        let size = parse_svg_dimensions(r#"<html width="10" height="10"></html>"#);
        assert!(matches!(size, SvgSize::Unknown { reason } if reason.contains("html")));
    }

    #[test]
    fn malformed_xml_is_unknown_not_panic() {
        assert!(matches!(
            parse_svg_dimensions(r#"<svg width="10" height=></svg>"#),
            SvgSize::Unknown { .. }
        ));
        assert!(matches!(parse_svg_dimensions(""), SvgSize::Unknown { .. }));
    }

    #[test]
    fn unreadable_file_is_unknown() {
        let size = svg_dimensions(Path::new("/nonexistent/logo.svg"));
        assert!(matches!(size, SvgSize::Unknown { .. }));
    }

    #[test]
    fn leading_number_parsing() {
        assert_eq!(leading_number("12.5pt"), Some(12.5));
        assert_eq!(leading_number("  7"), Some(7.0));
        assert_eq!(leading_number("1.2.3"), Some(1.2));
        assert_eq!(leading_number("auto"), None);
        assert_eq!(leading_number("0"), None);
        assert_eq!(leading_number(""), None);
    }
}
