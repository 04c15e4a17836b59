//! # Row Rendering
//!
//! Draws the template plus every field for one data row onto a fresh RGBA
//! surface. The export pipeline and the editor preview both go through
//! [`render_row`]; the preview additionally draws editor-only markers
//! ([`render_preview`]).
//!
//! ```text
//! Template ──► fresh surface ──► for each field (collection order):
//!                                   value = resolve_display_value(row)
//!                                   ""    → skipped
//!                                   Text  → text::render
//!                                   QR    → QrGenerator → composite
//!                                           (failure → "error" placeholder)
//! ```

pub mod qr;

pub use qr::{QrCodeGenerator, QrError, QrGenerator};

use image::{RgbaImage, imageops};
use tracing::warn;

use crate::binding::{BindingTable, resolve_display_value};
use crate::data::Row;
use crate::editor::hit_test::{FieldShape, field_bounds};
use crate::field::{Align, Color, Field, FieldKind};
use crate::geometry::Rect;
use crate::raster;
use crate::template::Template;
use crate::text::{self, FontBook, TextLayout};

const PLACEHOLDER_FILL: Color = Color::rgb(0xe0, 0xe0, 0xe0);
const PLACEHOLDER_INK: Color = Color::rgb(0x80, 0x80, 0x80);
const MARKER_COLOR: Color = Color::rgb(0xe6, 0x39, 0x46);
const SELECTION_COLOR: Color = Color::rgb(0x2f, 0x80, 0xed);

/// Render one row. `row: None` renders demo values.
pub async fn render_row(
    template: &Template,
    fields: &[Field],
    bindings: &BindingTable,
    row: Option<&Row>,
    fonts: &FontBook,
    qr: &dyn QrGenerator,
) -> RgbaImage {
    let mut surface = RgbaImage::new(template.width(), template.height());
    imageops::replace(&mut surface, template.image(), 0, 0);

    for field in fields {
        let value = resolve_display_value(field, row, bindings);
        if value.is_empty() {
            continue;
        }
        draw_field(&mut surface, field, &value, fonts, qr).await;
    }
    surface
}

/// Render one row with editor markers: a dot for text fields with nothing to
/// show, an outline for empty QR fields, and the selection outline.
pub async fn render_preview(
    template: &Template,
    fields: &[Field],
    bindings: &BindingTable,
    row: Option<&Row>,
    fonts: &FontBook,
    qr: &dyn QrGenerator,
    selected: Option<usize>,
) -> RgbaImage {
    let mut surface = render_row(template, fields, bindings, row, fonts, qr).await;

    for (index, field) in fields.iter().enumerate() {
        let value = resolve_display_value(field, row, bindings);
        let shape = field_bounds(field, &value, fonts);
        if value.is_empty() {
            match shape {
                FieldShape::Marker { center, radius } => {
                    raster::fill_circle(&mut surface, center.x, center.y, radius, MARKER_COLOR)
                }
                FieldShape::Box(rect) => {
                    raster::stroke_rect(&mut surface, rect, PLACEHOLDER_INK, 1.0)
                }
            }
        }
        if selected == Some(index) {
            raster::stroke_rect(&mut surface, shape.outline_rect(), SELECTION_COLOR, 2.0);
        }
    }
    surface
}

async fn draw_field(
    surface: &mut RgbaImage,
    field: &Field,
    value: &str,
    fonts: &FontBook,
    qr: &dyn QrGenerator,
) {
    match &field.kind {
        FieldKind::Text(style) => {
            let layout = TextLayout::from_markup(
                fonts,
                value,
                &style.font_family,
                style.font_size_px as f32,
            );
            text::render(
                surface,
                fonts,
                &layout,
                field.x,
                field.y,
                style.color,
                style.align,
            );
        }
        FieldKind::Qr(style) => {
            let size = style.module_size_px;
            let area = Rect::new(field.x, field.y, size as f32, size as f32);
            match qr.generate(value, size, style.color, style.background).await {
                Ok(bitmap) => {
                    let bitmap = if bitmap.dimensions() == (size, size) {
                        bitmap
                    } else {
                        imageops::resize(&bitmap, size, size, imageops::FilterType::Nearest)
                    };
                    raster::composite(
                        surface,
                        &bitmap,
                        raster::to_pixel(field.x),
                        raster::to_pixel(field.y),
                    );
                }
                Err(e) => {
                    warn!(
                        field = %field.name,
                        error = %e,
                        "QR generation failed, drawing placeholder"
                    );
                    draw_error_placeholder(surface, fonts, area);
                }
            }
        }
    }
}

/// Neutral box with an "error" label, drawn where a QR symbol failed.
pub fn draw_error_placeholder(surface: &mut RgbaImage, fonts: &FontBook, area: Rect) {
    raster::fill_rect(surface, area, PLACEHOLDER_FILL);
    raster::stroke_rect(surface, area, PLACEHOLDER_INK, 1.0);

    let label_size = (area.height / 5.0).clamp(8.0, 24.0);
    let layout =
        TextLayout::from_markup(fonts, "error", crate::field::DEFAULT_FONT_FAMILY, label_size);
    text::render(
        surface,
        fonts,
        &layout,
        area.x + area.width / 2.0,
        area.y + (area.height - label_size) / 2.0,
        PLACEHOLDER_INK,
        Align::Center,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::Rgba;

    struct FailingQr;

    #[async_trait]
    impl QrGenerator for FailingQr {
        async fn generate(
            &self,
            _text: &str,
            _size_px: u32,
            _foreground: Color,
            _background: Option<Color>,
        ) -> Result<RgbaImage, QrError> {
            Err(QrError::Encode("boom".to_string()))
        }
    }

    fn template() -> Template {
        Template::from_image(RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255])))
    }

    /// Render demo values (no data row) with the given generator.
    async fn render_demo(fields: &[Field], qr: &dyn QrGenerator) -> RgbaImage {
        let bindings = BindingTable::for_fields(fields);
        let fonts = FontBook::builtin();
        render_row(&template(), fields, &bindings, None, &fonts, qr).await
    }

    #[tokio::test]
    async fn test_empty_value_is_skipped() {
        let fields = vec![Field::text("greeting", 10.0, 10.0)];
        let out = render_demo(&fields, &QrCodeGenerator::default()).await;
        assert_eq!(out.as_raw(), template().image().as_raw());
    }

    #[tokio::test]
    async fn test_text_draws_ink() {
        let fields = vec![Field::text("greeting", 10.0, 10.0).with_demo("Ann")];
        let out = render_demo(&fields, &QrCodeGenerator::default()).await;
        assert!(out.pixels().any(|p| p.0[0] < 128));
    }

    #[tokio::test]
    async fn test_qr_failure_draws_placeholder() {
        let fields = vec![Field::qr("link", 10.0, 10.0).with_size(50).with_demo("x")];
        let out = render_demo(&fields, &FailingQr).await;
        // Interior of the placeholder box is the neutral fill.
        assert_eq!(out.get_pixel(12, 12), &Rgba([0xe0, 0xe0, 0xe0, 255]));
        // Outside the box is untouched.
        assert_eq!(out.get_pixel(80, 80), &Rgba([255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn test_qr_drawn_into_square() {
        let fields = vec![
            Field::qr("link", 20.0, 20.0)
                .with_size(60)
                .with_demo("https://example.com"),
        ];
        let out = render_demo(&fields, &QrCodeGenerator::default()).await;
        let dark_outside = out
            .enumerate_pixels()
            .filter(|(x, y, _)| *x < 20 || *y < 20 || *x >= 80 || *y >= 80)
            .any(|(_, _, p)| p.0[0] < 128);
        assert!(!dark_outside);
        assert!(out.pixels().any(|p| p.0 == [0, 0, 0, 255]));
    }

    #[tokio::test]
    async fn test_fields_far_off_canvas_leave_template_untouched() {
        let fields = vec![
            Field::qr("code", 3.0e9, 10.0).with_demo("https://example.com"),
            Field::text("greeting", 3.0e9, 10.0).with_size(72).with_demo("**Far** away"),
            Field::text("under", -3.0e9, -3.0e9).with_demo("__x__ ~~y~~"),
            Field::qr("broken", -3.0e9, 3.0e9).with_demo("x"),
        ];
        let out = render_demo(&fields[..3], &QrCodeGenerator::default()).await;
        assert_eq!(out.as_raw(), template().image().as_raw());

        let out = render_demo(&fields[3..], &FailingQr).await;
        assert_eq!(out.as_raw(), template().image().as_raw());
    }

    #[tokio::test]
    async fn test_preview_markers_far_off_canvas() {
        let fields = vec![Field::text("greeting", 3.0e9, -3.0e9), Field::qr("code", 3.0e9, 0.0)];
        let bindings = BindingTable::for_fields(&fields);
        let fonts = FontBook::builtin();
        let qr = QrCodeGenerator::default();
        let out = render_preview(&template(), &fields, &bindings, None, &fonts, &qr, Some(1)).await;
        assert_eq!(out.as_raw(), template().image().as_raw());
    }

    #[tokio::test]
    async fn test_preview_marks_empty_text_field() {
        let fields = vec![Field::text("greeting", 50.0, 50.0)];
        let bindings = BindingTable::for_fields(&fields);
        let fonts = FontBook::builtin();
        let out = render_preview(
            &template(),
            &fields,
            &bindings,
            None,
            &fonts,
            &QrCodeGenerator::default(),
            None,
        )
        .await;
        assert_eq!(out.get_pixel(50, 50), &Rgba([0xe6, 0x39, 0x46, 255]));
    }
}
