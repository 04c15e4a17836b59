//! TTF/OTF outline faces.
//!
//! Loaded at runtime from the paths named in the font catalog and rasterized
//! with ab_glyph into anti-aliased coverage.

use ab_glyph::{Font, FontArc, ScaleFont};
use std::path::Path;

use crate::error::FieldpressError;

/// Load a font file into a shareable face.
pub(crate) fn load_font(path: &Path) -> Result<FontArc, FieldpressError> {
    let bytes = std::fs::read(path)
        .map_err(|e| FieldpressError::Font(format!("Failed to read {}: {}", path.display(), e)))?;
    FontArc::try_from_vec(bytes)
        .map_err(|e| FieldpressError::Font(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Horizontal advance of one character at the given pixel height.
pub(crate) fn advance(font: &FontArc, ch: char, pixel_height: f32) -> f32 {
    let scaled = font.as_scaled(pixel_height);
    scaled.h_advance(font.glyph_id(ch))
}

/// Rasterize one character whose line box starts at `(left, top)`.
///
/// The baseline sits one ascent below `top`, so a line occupies roughly
/// `top..top + pixel_height`.
pub(crate) fn draw_char(
    font: &FontArc,
    ch: char,
    pixel_height: f32,
    left: f32,
    top: f32,
    plot: &mut dyn FnMut(i64, i64, f32),
) {
    let scaled = font.as_scaled(pixel_height);
    let baseline_y = top + scaled.ascent();
    let glyph = font
        .glyph_id(ch)
        .with_scale_and_position(pixel_height, ab_glyph::point(left, baseline_y));

    if let Some(outlined) = font.outline_glyph(glyph) {
        let bounds = outlined.px_bounds();
        outlined.draw(|px, py, coverage| {
            let x = (bounds.min.x as i64).saturating_add(px as i64);
            let y = (bounds.min.y as i64).saturating_add(py as i64);
            plot(x, y, coverage.min(1.0));
        });
    }
}
