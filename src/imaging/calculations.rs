//! Pure calculation functions for output sizes and pixel compositing.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Sizing;
use image::{Rgb, RgbImage, RgbaImage};

/// Calculate the rendered pixel size.
///
/// # Arguments
/// * `intrinsic` - SVG size in user units (width, height)
/// * `sizing` - Square side or uniform factor
///
/// # Returns
/// * `(width, height)` - Output size, each at least 1px
///
/// # Examples
/// ```
/// # use microstock_export::imaging::{Sizing, render_size};
/// // 200x100 at 2x → 400x200
/// assert_eq!(render_size((200.0, 100.0), Sizing::Scale(2.0)), (400, 200));
///
/// // square mode ignores the aspect ratio
/// assert_eq!(render_size((200.0, 100.0), Sizing::Square(1000)), (1000, 1000));
/// ```
pub fn render_size(intrinsic: (f32, f32), sizing: Sizing) -> (u32, u32) {
    match sizing {
        Sizing::Square(side) => (side.max(1), side.max(1)),
        Sizing::Scale(factor) => {
            let (w, h) = intrinsic;
            (scaled(w, factor), scaled(h, factor))
        }
    }
}

fn scaled(value: f32, factor: f32) -> u32 {
    ((value * factor).round() as u32).max(1)
}

/// Export width handed to the external tool.
///
/// `intrinsic_width × factor` when the width is known, otherwise the square
/// default. The flag reports whether the default was substituted.
pub fn tool_export_width(
    intrinsic_width: Option<f64>,
    factor: u32,
    default_width: u32,
) -> (u32, bool) {
    match intrinsic_width {
        Some(w) if w.is_finite() && w > 0.0 => (((w * factor as f64).round() as u32).max(1), false),
        _ => (default_width, true),
    }
}

/// Composite an RGBA image over opaque white.
///
/// Straight (non-premultiplied) alpha: `out = a·c + (1 − a)·255`.
pub fn flatten_over_white(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
