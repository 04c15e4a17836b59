//! Span geometry and drawing.
//!
//! [`TextLayout`] measures each span once with [`Face::advance`]. Hit-testing,
//! selection outlines and [`render`] all read from the same layout, so the
//! width a user can click on is the width that gets drawn.

use image::RgbaImage;

use super::fonts::{Face, FontBook};
use super::markup::{self, Span};
use crate::field::{Align, Color};
use crate::geometry::Rect;
use crate::raster;

/// Horizontal placement of one span relative to the layout's left edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanMetrics {
    pub offset: f32,
    pub width: f32,
}

/// Measured spans for one family and size.
#[derive(Debug, Clone)]
pub struct TextLayout {
    spans: Vec<Span>,
    metrics: Vec<SpanMetrics>,
    width: f32,
    size_px: f32,
    family: String,
}

fn run_width(face: &Face, text: &str, size_px: f32) -> f32 {
    text.chars().map(|ch| face.advance(ch, size_px)).sum()
}

impl TextLayout {
    pub fn new(fonts: &FontBook, spans: Vec<Span>, family: &str, size_px: f32) -> Self {
        let faces = fonts.family(family);
        let mut metrics = Vec::with_capacity(spans.len());
        let mut cursor = 0.0;
        for span in &spans {
            let (face, _) = faces.select(span.style);
            let width = run_width(face, &span.text, size_px);
            metrics.push(SpanMetrics {
                offset: cursor,
                width,
            });
            cursor += width;
        }
        Self {
            spans,
            metrics,
            width: cursor,
            size_px,
            family: family.to_string(),
        }
    }

    /// Parse markup and measure it in one step.
    pub fn from_markup(fonts: &FontBook, raw: &str, family: &str, size_px: f32) -> Self {
        Self::new(fonts, markup::parse(raw), family, size_px)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn metrics(&self) -> &[SpanMetrics] {
        &self.metrics
    }

    /// Box covered by the text when anchored at `(x, y)` with `align`.
    pub fn bounds(&self, x: f32, y: f32, align: Align) -> Rect {
        Rect::new(align.start_x(x, self.width), y, self.width, self.size_px)
    }
}

/// Total advance width of `spans`.
pub fn measure(fonts: &FontBook, spans: &[Span], family: &str, size_px: f32) -> f32 {
    TextLayout::new(fonts, spans.to_vec(), family, size_px).width()
}

/// Cumulative start offset of each span.
pub fn span_offsets(fonts: &FontBook, spans: &[Span], family: &str, size_px: f32) -> Vec<f32> {
    TextLayout::new(fonts, spans.to_vec(), family, size_px)
        .metrics()
        .iter()
        .map(|m| m.offset)
        .collect()
}

/// Draw a measured layout anchored at `(x, y)`.
///
/// Returns the width actually advanced while drawing, which always equals
/// [`TextLayout::width`].
pub fn render(
    surface: &mut RgbaImage,
    fonts: &FontBook,
    layout: &TextLayout,
    x: f32,
    y: f32,
    color: Color,
    align: Align,
) -> f32 {
    let faces = fonts.family(&layout.family);
    let size = layout.size_px;
    let start_x = align.start_x(x, layout.width);
    let rule_thickness = (size / 20.0).max(1.0);
    let mut advanced = 0.0;

    for (span, metrics) in layout.spans.iter().zip(&layout.metrics) {
        let (face, synthetic) = faces.select(span.style);
        let span_x = start_x + metrics.offset;
        let mut span_advance = 0.0;
        for ch in span.text.chars() {
            let left = span_x + span_advance;
            face.draw_char(ch, size, left, y, synthetic, &mut |px, py, coverage| {
                raster::blend_pixel(surface, px, py, color, coverage)
            });
            span_advance += face.advance(ch, size);
        }
        advanced += span_advance;

        if span.style.underline {
            let rule = Rect::new(span_x, y + 0.9 * size, metrics.width, rule_thickness);
            raster::fill_rect(surface, rule, color);
        }
        if span.style.strikethrough {
            let rule = Rect::new(span_x, y + 0.5 * size, metrics.width, rule_thickness);
            raster::fill_rect(surface, rule, color);
        }
    }

    advanced
}
