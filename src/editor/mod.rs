//! # Editor Session
//!
//! [`Editor`] owns everything a user edits: the field collection, the
//! binding table, the selection, the viewport, and the interaction state
//! machine (see [`interaction`]). It is a plain `&mut self` object; the HTTP
//! backend wraps it in a lock.
//!
//! The field collection and the binding table always hold the same set of
//! names. Every operation that adds, removes, or renames a field updates both
//! or neither.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use fieldpress::editor::{Editor, PointerEvent};
//! use fieldpress::text::FontBook;
//! use fieldpress::viewport::ViewportConfig;
//!
//! let mut editor = Editor::new(Arc::new(FontBook::builtin()), ViewportConfig::default());
//! editor.pointer_down(PointerEvent::primary(40.0, 40.0));
//! let index = editor.submit_field_name(Some("name")).unwrap();
//! assert_eq!(index, Some(0));
//! assert_eq!(editor.fields()[0].name, "name");
//! ```

pub mod interaction;

pub use hit_test::{FieldShape, HitResult, MARKER_RADIUS, field_bounds, hit_test};
pub use interaction::{
    CursorHint, InteractionState, NamePrompt, Outcome, PointerButton, PointerEvent, WheelOutcome,
    WHEEL_STEP,
};

use image::RgbaImage;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::binding::{BindingTable, resolve_display_value, unmapped_fields};
use crate::data::{Dataset, Row};
use crate::error::FieldpressError;
use crate::export::ExportJob;
use crate::field::{Align, Color, Field, FieldKind, FieldType};
use crate::geometry::Point;
use crate::layout::Layout;
use crate::naming::FileNamingPolicy;
use crate::render::{self, QrGenerator};
use crate::template::Template;
use crate::text::FontBook;
use crate::viewport::{Viewport, ViewportConfig};

/// Partial property update for one field. Absent members are left alone;
/// members that do not apply to the field's kind are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub demo_value: Option<String>,
    /// Font size (text) or side length (QR), clamped.
    pub size: Option<i64>,
    pub font_family: Option<String>,
    pub color: Option<Color>,
    pub align: Option<Align>,
    pub background: Option<Color>,
    /// Clears the QR background. Wins over `background`.
    pub transparent_background: Option<bool>,
}

pub struct Editor {
    fields: Vec<Field>,
    bindings: BindingTable,
    selected: Option<usize>,
    state: InteractionState,
    tool: FieldType,
    viewport: Viewport,
    template: Option<Arc<Template>>,
    dataset: Option<Arc<Dataset>>,
    preview_row: usize,
    naming: FileNamingPolicy,
    fonts: Arc<FontBook>,
}

impl Editor {
    pub fn new(fonts: Arc<FontBook>, viewport: ViewportConfig) -> Self {
        Self {
            fields: Vec::new(),
            bindings: BindingTable::new(),
            selected: None,
            state: InteractionState::Idle,
            tool: FieldType::Text,
            viewport: Viewport::new(viewport),
            template: None,
            dataset: None,
            preview_row: 0,
            naming: FileNamingPolicy::default(),
            fonts,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn tool(&self) -> FieldType {
        self.tool
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn template(&self) -> Option<&Arc<Template>> {
        self.template.as_ref()
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.dataset.as_ref()
    }

    pub fn fonts(&self) -> &Arc<FontBook> {
        &self.fonts
    }

    pub fn naming_policy(&self) -> &FileNamingPolicy {
        &self.naming
    }

    pub fn preview_row(&self) -> usize {
        self.preview_row
    }

    // ===== Fields =====

    fn check_name(&self, name: &str, except: Option<usize>) -> Result<(), FieldpressError> {
        if name.is_empty() {
            return Err(FieldpressError::InvalidField(
                "Field name cannot be empty".to_string(),
            ));
        }
        let taken = self
            .fields
            .iter()
            .enumerate()
            .any(|(i, f)| Some(i) != except && f.name == name);
        if taken {
            return Err(FieldpressError::InvalidField(format!(
                "A field named '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), FieldpressError> {
        if index >= self.fields.len() {
            return Err(FieldpressError::InvalidField(format!(
                "No field at index {}",
                index
            )));
        }
        Ok(())
    }

    /// Append a field on top of the others with an unbound binding.
    pub fn add_field(&mut self, mut field: Field) -> Result<usize, FieldpressError> {
        field.name = field.name.trim().to_string();
        self.check_name(&field.name, None)?;
        field.normalize();

        self.bindings.insert(&field.name);
        self.fields.push(field);
        let index = self.fields.len() - 1;
        debug!(index, name = %self.fields[index].name, "field added");
        Ok(index)
    }

    /// Remove a field and its binding. The selection follows the field it
    /// pointed at, or clears if that field was removed.
    pub fn remove_field(&mut self, index: usize) -> Result<Field, FieldpressError> {
        self.check_index(index)?;
        let field = self.fields.remove(index);
        self.bindings.remove(&field.name);

        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        if matches!(
            self.state,
            InteractionState::DraggingField { .. } | InteractionState::ResizingField { .. }
        ) {
            self.state = InteractionState::Idle;
        }
        debug!(index, name = %field.name, "field removed");
        Ok(field)
    }

    /// Rename a field and its binding together.
    pub fn rename_field(&mut self, index: usize, new_name: &str) -> Result<(), FieldpressError> {
        self.check_index(index)?;
        let new_name = new_name.trim();
        self.check_name(new_name, Some(index))?;

        let old = &self.fields[index].name;
        self.bindings.rename(old, new_name)?;
        self.fields[index].name = new_name.to_string();
        Ok(())
    }

    /// Bind a field to a column, or unbind it with `None`.
    pub fn bind_field(
        &mut self,
        index: usize,
        column: Option<String>,
    ) -> Result<(), FieldpressError> {
        self.check_index(index)?;
        let column = column
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if let (Some(column), Some(dataset)) = (column.as_deref(), &self.dataset) {
            if !dataset.headers().iter().any(|h| h == column) {
                return Err(FieldpressError::InvalidField(format!(
                    "Column '{}' is not in the loaded data",
                    column
                )));
            }
        }
        self.bindings.bind(&self.fields[index].name, column)
    }

    /// Apply a partial property update. A rejected rename leaves the field
    /// untouched.
    pub fn update_field(&mut self, index: usize, patch: FieldPatch) -> Result<(), FieldpressError> {
        self.check_index(index)?;
        if let Some(name) = &patch.name {
            self.rename_field(index, name)?;
        }

        let field = &mut self.fields[index];
        if let Some(x) = patch.x {
            field.x = x;
        }
        if let Some(y) = patch.y {
            field.y = y;
        }
        if let Some(demo) = patch.demo_value {
            field.demo_value = demo;
        }
        if let Some(size) = patch.size {
            field.set_size_metric(size);
        }
        match &mut field.kind {
            FieldKind::Text(style) => {
                if let Some(family) = patch.font_family {
                    style.font_family = family;
                }
                if let Some(color) = patch.color {
                    style.color = color;
                }
                if let Some(align) = patch.align {
                    style.align = align;
                }
            }
            FieldKind::Qr(style) => {
                if let Some(color) = patch.color {
                    style.color = color;
                }
                if let Some(background) = patch.background {
                    style.background = Some(background);
                }
                if patch.transparent_background == Some(true) {
                    style.background = None;
                }
            }
        }
        Ok(())
    }

    /// Kind of field created by the next click on empty canvas.
    pub fn set_tool(&mut self, tool: FieldType) {
        self.tool = tool;
    }

    pub fn select(&mut self, index: Option<usize>) -> Result<(), FieldpressError> {
        if let Some(index) = index {
            self.check_index(index)?;
        }
        self.selected = index;
        Ok(())
    }

    // ===== Template, data, naming =====

    /// Install a template and fit it into the available area with no pan.
    pub fn load_template(
        &mut self,
        template: Template,
        available_width: f32,
        available_height: f32,
    ) {
        self.viewport.reset_for_template(
            template.width() as f32,
            template.height() as f32,
            available_width,
            available_height,
        );
        self.template = Some(Arc::new(template));
    }

    /// Install a dataset. The preview row is kept if still in range.
    pub fn load_dataset(&mut self, dataset: Dataset) {
        self.dataset = Some(Arc::new(dataset));
        self.clamp_preview_row();
    }

    pub fn set_preview_row(&mut self, row: usize) {
        self.preview_row = row;
        self.clamp_preview_row();
    }

    fn clamp_preview_row(&mut self) {
        let len = self.dataset.as_ref().map_or(0, |d| d.len());
        self.preview_row = self.preview_row.min(len.saturating_sub(1));
    }

    pub fn set_naming_policy(&mut self, policy: FileNamingPolicy) {
        self.naming = policy;
    }

    /// Replace fields, bindings, and naming with a layout's.
    pub fn apply_layout(&mut self, layout: Layout) -> Result<(), FieldpressError> {
        let (fields, bindings, naming) = layout.into_parts()?;
        self.fields = fields;
        self.bindings = bindings;
        self.naming = naming;
        self.selected = None;
        self.state = InteractionState::Idle;
        Ok(())
    }

    /// Current fields, bindings, and naming as a layout.
    pub fn layout(&self) -> Layout {
        Layout::from_parts(&self.fields, &self.bindings, &self.naming)
    }

    // ===== Queries =====

    /// The row shown in the preview, if data is loaded.
    pub fn preview_row_data(&self) -> Option<&Row> {
        self.dataset.as_ref()?.row(self.preview_row)
    }

    /// Display value of every field for the preview row, in field order.
    pub fn display_values(&self) -> Vec<String> {
        let row = self.preview_row_data();
        self.fields
            .iter()
            .map(|f| resolve_display_value(f, row, &self.bindings))
            .collect()
    }

    pub(crate) fn hit_test(&self, point: Point) -> HitResult {
        hit_test(point, &self.fields, &self.display_values(), &self.fonts)
    }

    pub fn unmapped_fields(&self) -> Vec<&Field> {
        unmapped_fields(&self.fields, &self.bindings)
    }

    /// Snapshot of everything a batch run needs.
    pub fn export_job(&self) -> Result<ExportJob, FieldpressError> {
        let template = self
            .template
            .clone()
            .ok_or_else(|| FieldpressError::MissingInput("No template loaded".to_string()))?;
        let dataset = self
            .dataset
            .clone()
            .ok_or_else(|| FieldpressError::MissingInput("No data loaded".to_string()))?;
        ExportJob::new(
            template,
            dataset,
            self.fields.clone(),
            self.bindings.clone(),
            self.naming.clone(),
            self.fonts.clone(),
        )
    }

    /// Render the preview row with editor markers and the selection outline.
    pub async fn render_preview(&self, qr: &dyn QrGenerator) -> Result<RgbaImage, FieldpressError> {
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| FieldpressError::MissingInput("No template loaded".to_string()))?;
        Ok(render::render_preview(
            template,
            &self.fields,
            &self.bindings,
            self.preview_row_data(),
            &self.fonts,
            qr,
            self.selected,
        )
        .await)
    }

    #[cfg(test)]
    pub(crate) fn fields_mut_for_test(&mut self) -> &mut [Field] {
        &mut self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    fn editor() -> Editor {
        Editor::new(Arc::new(FontBook::builtin()), ViewportConfig::default())
    }

    fn names(ed: &Editor) -> Vec<&str> {
        ed.fields().iter().map(|f| f.name.as_str()).collect()
    }

    fn binding_names(ed: &Editor) -> Vec<&str> {
        ed.bindings().iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_add_rejects_empty_and_duplicate() {
        let mut ed = editor();
        ed.add_field(Field::text("a", 0.0, 0.0)).unwrap();
        assert!(ed.add_field(Field::text("  ", 0.0, 0.0)).is_err());
        assert!(ed.add_field(Field::qr("a", 0.0, 0.0)).is_err());
        assert_eq!(names(&ed), vec!["a"]);
        assert_eq!(binding_names(&ed), vec!["a"]);
    }

    #[test]
    fn test_remove_fixes_selection() {
        let mut ed = editor();
        for name in ["a", "b", "c"] {
            ed.add_field(Field::text(name, 0.0, 0.0)).unwrap();
        }
        ed.select(Some(2)).unwrap();
        ed.remove_field(0).unwrap();
        assert_eq!(ed.selected(), Some(1));
        assert_eq!(ed.fields()[1].name, "c");

        ed.remove_field(1).unwrap();
        assert_eq!(ed.selected(), None);
        assert_eq!(binding_names(&ed), vec!["b"]);
        assert!(ed.remove_field(5).is_err());
    }

    #[test]
    fn test_rename_moves_binding() {
        let mut ed = editor();
        ed.add_field(Field::text("a", 0.0, 0.0)).unwrap();
        ed.add_field(Field::text("b", 0.0, 0.0)).unwrap();
        ed.bind_field(0, Some("name".to_string())).unwrap();

        ed.rename_field(0, "greeting").unwrap();
        assert_eq!(ed.bindings().column_for("greeting"), Some("name"));
        assert!(!ed.bindings().contains("a"));

        assert!(ed.rename_field(0, "b").is_err());
        assert!(ed.rename_field(0, "").is_err());
        assert_eq!(names(&ed), vec!["greeting", "b"]);
        assert_eq!(binding_names(&ed), vec!["b", "greeting"]);
    }

    #[test]
    fn test_bind_checks_loaded_headers() {
        let mut ed = editor();
        ed.add_field(Field::text("a", 0.0, 0.0)).unwrap();
        ed.load_dataset(Dataset::new(
            vec!["name".to_string()],
            vec![Row::new([("name", "Ann")])],
        ));
        assert!(ed.bind_field(0, Some("email".to_string())).is_err());
        ed.bind_field(0, Some("name".to_string())).unwrap();
        assert_eq!(ed.display_values(), vec!["Ann".to_string()]);
        ed.bind_field(0, None).unwrap();
        assert_eq!(ed.unmapped_fields().len(), 1);
    }

    #[test]
    fn test_update_field_patch() {
        let mut ed = editor();
        ed.add_field(Field::text("a", 0.0, 0.0)).unwrap();
        ed.add_field(Field::qr("b", 0.0, 0.0)).unwrap();

        let patch: FieldPatch = serde_json::from_str(
            r##"{"x": 5, "size": 500, "align": "right", "color": "#ff0000", "demo_value": "Hi"}"##,
        )
        .unwrap();
        ed.update_field(0, patch).unwrap();
        let field = &ed.fields()[0];
        assert_eq!(field.x, 5.0);
        assert_eq!(field.demo_value, "Hi");
        let style = field.as_text().unwrap();
        assert_eq!(style.font_size_px, 72);
        assert_eq!(style.align, Align::Right);
        assert_eq!(style.color, Color::rgb(255, 0, 0));

        ed.update_field(
            1,
            FieldPatch {
                transparent_background: Some(true),
                size: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        let qr = ed.fields()[1].as_qr().unwrap();
        assert_eq!(qr.background, None);
        assert_eq!(qr.module_size_px, 20);

        let clash = FieldPatch {
            name: Some("a".to_string()),
            x: Some(99.0),
            ..Default::default()
        };
        assert!(ed.update_field(1, clash).is_err());
        assert_eq!(ed.fields()[1].x, 0.0);
    }

    #[test]
    fn test_load_template_resets_viewport() {
        let mut ed = editor();
        ed.viewport_mut().pan_by(40.0, 40.0);
        ed.load_template(
            Template::from_image(RgbaImage::new(1000, 500)),
            500.0,
            500.0,
        );
        assert_eq!(ed.viewport().zoom(), 0.5);
        assert_eq!(ed.viewport().pan(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_preview_row_clamped() {
        let mut ed = editor();
        ed.set_preview_row(4);
        assert_eq!(ed.preview_row(), 0);
        ed.load_dataset(Dataset::new(
            vec!["n".to_string()],
            vec![Row::new([("n", "1")]), Row::new([("n", "2")])],
        ));
        ed.set_preview_row(4);
        assert_eq!(ed.preview_row(), 1);
    }

    #[test]
    fn test_export_job_preconditions() {
        let mut ed = editor();
        assert!(matches!(ed.export_job(), Err(FieldpressError::MissingInput(_))));
        ed.load_template(Template::from_image(RgbaImage::new(10, 10)), 10.0, 10.0);
        assert!(matches!(ed.export_job(), Err(FieldpressError::MissingInput(_))));
        ed.load_dataset(Dataset::new(vec!["n".to_string()], vec![Row::new([("n", "1")])]));
        assert!(matches!(ed.export_job(), Err(FieldpressError::MissingInput(_))));
        ed.add_field(Field::text("n", 0.0, 0.0)).unwrap();
        let job = ed.export_job().unwrap();

        // Later edits do not reach the snapshot.
        ed.remove_field(0).unwrap();
        assert_eq!(job.fields.len(), 1);
    }

    #[tokio::test]
    async fn test_render_preview_draws_selection() {
        let mut ed = editor();
        assert!(ed.render_preview(&render::QrCodeGenerator::default()).await.is_err());

        ed.load_template(
            Template::from_image(RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]))),
            100.0,
            100.0,
        );
        ed.add_field(Field::qr("code", 20.0, 20.0).with_size(40)).unwrap();
        ed.select(Some(0)).unwrap();
        let img = ed.render_preview(&render::QrCodeGenerator::default()).await.unwrap();
        assert_eq!(img.get_pixel(20, 40), &Rgba([0x2f, 0x80, 0xed, 255]));
    }
}
