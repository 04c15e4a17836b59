//! Built-in bitmap face.
//!
//! Uses the Spleen 12x24 PSF2 font, scaled nearest-neighbour to the
//! requested pixel size. Always available, so it is the fallback for any
//! family the font book does not know.

use spleen_font::{FONT_12X24, PSF2Font};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

pub(crate) const CELL_WIDTH: usize = 12;
pub(crate) const CELL_HEIGHT: usize = 24;

/// Horizontal advance of every glyph at the given pixel height.
pub(crate) fn advance(pixel_height: f32) -> f32 {
    pixel_height * CELL_WIDTH as f32 / CELL_HEIGHT as f32
}

/// Glyphs already decoded from the PSF2 data, keyed by character.
static GLYPH_CACHE: LazyLock<Mutex<HashMap<char, Arc<[bool]>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// 12x24 on/off bitmap for a character. Unknown characters get a box.
pub(crate) fn glyph_bitmap(ch: char) -> Arc<[bool]> {
    let mut cache = GLYPH_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    cache
        .entry(ch)
        .or_insert_with(|| decode_glyph(ch).into())
        .clone()
}

fn decode_glyph(ch: char) -> Vec<bool> {
    let mut glyph = vec![false; CELL_WIDTH * CELL_HEIGHT];

    let found = PSF2Font::new(FONT_12X24).ok().and_then(|mut spleen| {
        let utf8 = ch.to_string();
        let spleen_glyph = spleen.glyph_for_utf8(utf8.as_bytes())?;
        for (row_y, row) in spleen_glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                let idx = row_y * CELL_WIDTH + col_x;
                if col_x < CELL_WIDTH && idx < glyph.len() {
                    glyph[idx] = on;
                }
            }
        }
        Some(())
    });

    if found.is_none() {
        draw_box(&mut glyph, CELL_WIDTH, CELL_HEIGHT);
    }
    glyph
}

/// Draw one character with its cell's top-left corner at `(left, top)`.
///
/// `plot` receives integer pixel coordinates and a coverage in `0.0..=1.0`.
pub(crate) fn draw_char(
    ch: char,
    pixel_height: f32,
    left: f32,
    top: f32,
    plot: &mut dyn FnMut(i64, i64, f32),
) {
    if ch.is_whitespace() {
        return;
    }
    let glyph = glyph_bitmap(ch);
    let dst_w = advance(pixel_height).round().max(1.0) as usize;
    let dst_h = pixel_height.round().max(1.0) as usize;
    let origin_x = left.round() as i64;
    let origin_y = top.round() as i64;

    for dy in 0..dst_h {
        let sy = dy * CELL_HEIGHT / dst_h;
        for dx in 0..dst_w {
            let sx = dx * CELL_WIDTH / dst_w;
            if glyph[sy * CELL_WIDTH + sx] {
                plot(
                    origin_x.saturating_add(dx as i64),
                    origin_y.saturating_add(dy as i64),
                    1.0,
                );
            }
        }
    }
}

/// Draw a box outline in the glyph buffer.
fn draw_box(glyph: &mut [bool], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = true;
        glyph[(height - 1) * width + x] = true;
    }
    for y in 0..height {
        glyph[y * width] = true;
        glyph[y * width + width - 1] = true;
    }
}
