//! Pixel-level drawing onto RGBA surfaces.
//!
//! All helpers clip to the surface and alpha-blend with "source over".

use image::{Rgba, RgbaImage};

use crate::field::Color;
use crate::geometry::Rect;

/// Blend `color` at `coverage` (0.0..=1.0) over the pixel at `(x, y)`.
pub fn blend_pixel(surface: &mut RgbaImage, x: i64, y: i64, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x >= surface.width() as i64 || y >= surface.height() as i64 {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let dst = surface.get_pixel_mut(x as u32, y as u32);
    let src = [color.r, color.g, color.b];
    let dst_a = dst.0[3] as f32 / 255.0;
    let out_a = alpha + dst_a * (1.0 - alpha);
    for c in 0..3 {
        let blended = (src[c] as f32 * alpha + dst.0[c] as f32 * dst_a * (1.0 - alpha)) / out_a;
        dst.0[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

/// Pixel coordinate of a content-space position. Saturates for positions
/// far outside any surface.
pub fn to_pixel(v: f32) -> i64 {
    v.round() as i64
}

/// Half-open pixel span `[start, end)` clipped to `0..limit`.
fn clip_span(start: i64, end: i64, limit: u32) -> std::ops::Range<i64> {
    start.max(0)..end.min(limit as i64)
}

/// Fill a rectangle with a solid color.
pub fn fill_rect(surface: &mut RgbaImage, rect: Rect, color: Color) {
    let xs = clip_span(to_pixel(rect.x), to_pixel(rect.x + rect.width), surface.width());
    let ys = clip_span(to_pixel(rect.y), to_pixel(rect.y + rect.height), surface.height());
    for y in ys {
        for x in xs.clone() {
            blend_pixel(surface, x, y, color, 1.0);
        }
    }
}

/// Outline a rectangle with a line of the given thickness, drawn inside it.
pub fn stroke_rect(surface: &mut RgbaImage, rect: Rect, color: Color, thickness: f32) {
    let t = thickness.max(1.0);
    fill_rect(surface, Rect::new(rect.x, rect.y, rect.width, t), color);
    fill_rect(
        surface,
        Rect::new(rect.x, rect.y + rect.height - t, rect.width, t),
        color,
    );
    fill_rect(surface, Rect::new(rect.x, rect.y, t, rect.height), color);
    fill_rect(
        surface,
        Rect::new(rect.x + rect.width - t, rect.y, t, rect.height),
        color,
    );
}

/// Fill a circle centered at `(cx, cy)`.
pub fn fill_circle(surface: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Color) {
    let r = radius.ceil().max(0.0) as i64;
    let (icx, icy) = (to_pixel(cx), to_pixel(cy));
    let xs = clip_span(icx.saturating_sub(r), icx.saturating_add(r + 1), surface.width());
    let ys = clip_span(icy.saturating_sub(r), icy.saturating_add(r + 1), surface.height());
    for y in ys {
        for x in xs.clone() {
            let (dx, dy) = ((x - icx) as f32, (y - icy) as f32);
            if dx * dx + dy * dy <= radius * radius {
                blend_pixel(surface, x, y, color, 1.0);
            }
        }
    }
}

/// Composite `overlay` onto `surface` with its top-left at `(x, y)`,
/// honouring the overlay's alpha channel.
pub fn composite(surface: &mut RgbaImage, overlay: &RgbaImage, x: i64, y: i64) {
    let xs = clip_span(x, x.saturating_add(overlay.width() as i64), surface.width());
    let ys = clip_span(y, y.saturating_add(overlay.height() as i64), surface.height());
    for sy in ys {
        for sx in xs.clone() {
            let Rgba([r, g, b, a]) = *overlay.get_pixel((sx - x) as u32, (sy - y) as u32);
            blend_pixel(surface, sx, sy, Color::rgb(r, g, b), a as f32 / 255.0);
        }
    }
}
