//! Pointer and wheel state machine.
//!
//! ```text
//!            secondary down                     primary down on field
//!   Panning ◄────────────── Idle ─────────────────────────► DraggingField
//!      │                    │  ▲ ▲                 (shift) ► ResizingField
//!      └──── pointer up ────┘  │ └──────── pointer up ──────────┘
//!                              │
//!     primary down on empty ──►TypingFieldName── name / cancel ──► Idle
//! ```
//!
//! Pointer coordinates arrive in device space and are converted with the
//! editor's viewport before hit-testing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Editor;
use crate::error::FieldpressError;
use crate::field::Field;
use crate::geometry::Point;

/// Size change per wheel notch, in the field's size unit.
pub const WHEEL_STEP: i64 = 2;

/// Resize drag sensitivity: size units per content pixel of vertical travel.
const RESIZE_RATE: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    /// Starts a pan gesture.
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Device-space position.
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub button: PointerButton,
    /// Resize modifier (shift) held.
    #[serde(default)]
    pub resize: bool,
}

impl PointerEvent {
    pub fn primary(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Primary,
            resize: false,
        }
    }

    pub fn secondary(x: f32, y: f32) -> Self {
        Self {
            button: PointerButton::Secondary,
            ..Self::primary(x, y)
        }
    }

    pub fn with_resize(mut self) -> Self {
        self.resize = true;
        self
    }

    pub fn device_point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InteractionState {
    #[default]
    Idle,
    /// `last` is the previous device position of the pan gesture.
    Panning { last: Point },
    DraggingField {
        index: usize,
        anchor_start: Point,
        pointer_start: Point,
    },
    ResizingField {
        index: usize,
        size_start: u32,
        pointer_start: Point,
    },
    /// Waiting for the name prompt; `at` is the content-space click.
    TypingFieldName { at: Point },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorHint {
    Default,
    Crosshair,
    Move,
    Grabbing,
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Ignored,
    PanStarted,
    Panned,
    DragStarted { index: usize },
    ResizeStarted { index: usize },
    Moved { index: usize, x: f32, y: f32 },
    Resized { index: usize, size: u32 },
    NameRequested { at: Point },
    Hover { cursor: CursorHint },
    Released,
}

/// What a wheel event did. `Consumed` means the host must suppress its
/// default scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WheelOutcome {
    Consumed { index: usize, size: u32 },
    PassThrough,
}

/// Asks the user for a new field's name. `None` cancels.
pub trait NamePrompt {
    fn prompt_field_name(&mut self, at: Point) -> Option<String>;
}

impl<F> NamePrompt for F
where
    F: FnMut(Point) -> Option<String>,
{
    fn prompt_field_name(&mut self, at: Point) -> Option<String> {
        self(at)
    }
}

impl Editor {
    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> Outcome {
        if self.state != InteractionState::Idle {
            return Outcome::Ignored;
        }

        if event.button == PointerButton::Secondary {
            self.state = InteractionState::Panning {
                last: event.device_point(),
            };
            return Outcome::PanStarted;
        }

        let point = self.viewport.to_content_space(event.device_point());
        let hit = self.hit_test(point);
        match hit.index {
            Some(index) => {
                self.selected = Some(index);
                let field = &self.fields[index];
                if event.resize {
                    self.state = InteractionState::ResizingField {
                        index,
                        size_start: field.size_metric(),
                        pointer_start: point,
                    };
                    Outcome::ResizeStarted { index }
                } else {
                    self.state = InteractionState::DraggingField {
                        index,
                        anchor_start: Point::new(field.x, field.y),
                        pointer_start: point,
                    };
                    Outcome::DragStarted { index }
                }
            }
            None => {
                self.selected = None;
                self.state = InteractionState::TypingFieldName { at: point };
                Outcome::NameRequested { at: point }
            }
        }
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> Outcome {
        match self.state {
            InteractionState::Idle => {
                let point = self.viewport.to_content_space(event.device_point());
                let cursor = if self.hit_test(point).index.is_some() {
                    CursorHint::Move
                } else {
                    CursorHint::Crosshair
                };
                Outcome::Hover { cursor }
            }
            InteractionState::Panning { last } => {
                let current = event.device_point();
                let delta = current - last;
                self.viewport.pan_by(delta.x, delta.y);
                self.state = InteractionState::Panning { last: current };
                Outcome::Panned
            }
            InteractionState::DraggingField {
                index,
                anchor_start,
                pointer_start,
            } => {
                let point = self.viewport.to_content_space(event.device_point());
                let Some(field) = self.fields.get_mut(index) else {
                    self.state = InteractionState::Idle;
                    return Outcome::Ignored;
                };
                let anchor = anchor_start + (point - pointer_start);
                field.x = anchor.x;
                field.y = anchor.y;
                Outcome::Moved {
                    index,
                    x: anchor.x,
                    y: anchor.y,
                }
            }
            InteractionState::ResizingField {
                index,
                size_start,
                pointer_start,
            } => {
                let point = self.viewport.to_content_space(event.device_point());
                let Some(field) = self.fields.get_mut(index) else {
                    self.state = InteractionState::Idle;
                    return Outcome::Ignored;
                };
                let size = size_start as f32 + RESIZE_RATE * (point.y - pointer_start.y);
                field.set_size_metric(size.round() as i64);
                Outcome::Resized {
                    index,
                    size: field.size_metric(),
                }
            }
            InteractionState::TypingFieldName { .. } => Outcome::Ignored,
        }
    }

    /// Ends a drag, resize or pan wherever the pointer is.
    pub fn pointer_up(&mut self, _event: PointerEvent) -> Outcome {
        match self.state {
            InteractionState::Panning { .. }
            | InteractionState::DraggingField { .. }
            | InteractionState::ResizingField { .. } => {
                self.state = InteractionState::Idle;
                Outcome::Released
            }
            InteractionState::Idle | InteractionState::TypingFieldName { .. } => Outcome::Ignored,
        }
    }

    /// Grow (scroll up, `delta_y < 0`) or shrink the field under the pointer.
    pub fn wheel(&mut self, x: f32, y: f32, delta_y: f32) -> WheelOutcome {
        if delta_y == 0.0 || matches!(self.state, InteractionState::TypingFieldName { .. }) {
            return WheelOutcome::PassThrough;
        }
        let point = self.viewport.to_content_space(Point::new(x, y));
        let Some(index) = self.hit_test(point).index else {
            return WheelOutcome::PassThrough;
        };
        let step = if delta_y < 0.0 { WHEEL_STEP } else { -WHEEL_STEP };
        let field = &mut self.fields[index];
        field.set_size_metric(field.size_metric() as i64 + step);
        WheelOutcome::Consumed {
            index,
            size: field.size_metric(),
        }
    }

    /// Answer a pending name request. `None`, blank, or a taken name creates
    /// nothing; the machine returns to idle in every case.
    pub fn submit_field_name(
        &mut self,
        name: Option<&str>,
    ) -> Result<Option<usize>, FieldpressError> {
        let InteractionState::TypingFieldName { at } = self.state else {
            return Err(FieldpressError::InvalidField(
                "No field name was requested".to_string(),
            ));
        };
        self.state = InteractionState::Idle;

        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            debug!("field creation cancelled");
            return Ok(None);
        };
        let field = Field::new(self.tool, name, at.x, at.y);
        let index = self.add_field(field)?;
        self.selected = Some(index);
        Ok(Some(index))
    }

    /// Resolve a pending name request with a synchronous prompt.
    pub fn resolve_name_prompt(
        &mut self,
        prompt: &mut dyn NamePrompt,
    ) -> Result<Option<usize>, FieldpressError> {
        let InteractionState::TypingFieldName { at } = self.state else {
            return Ok(None);
        };
        let answer = prompt.prompt_field_name(at);
        self.submit_field_name(answer.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldType, QR_SIZE_RANGE, TEXT_SIZE_RANGE};
    use crate::text::FontBook;
    use crate::viewport::ViewportConfig;
    use std::sync::Arc;

    fn editor() -> Editor {
        Editor::new(Arc::new(FontBook::builtin()), ViewportConfig::default())
    }

    fn editor_with(field: Field) -> Editor {
        let mut ed = editor();
        ed.add_field(field).unwrap();
        ed
    }

    #[test]
    fn test_drag_moves_anchor_by_pointer_delta() {
        let mut ed = editor_with(Field::qr("code", 50.0, 50.0).with_size(40));
        assert_eq!(
            ed.pointer_down(PointerEvent::primary(50.0, 50.0)),
            Outcome::DragStarted { index: 0 }
        );
        ed.pointer_move(PointerEvent::primary(60.0, 65.0));
        assert_eq!((ed.fields()[0].x, ed.fields()[0].y), (60.0, 65.0));
        assert_eq!(ed.pointer_up(PointerEvent::primary(999.0, 999.0)), Outcome::Released);
        assert_eq!(ed.state(), InteractionState::Idle);
        assert_eq!(ed.selected(), Some(0));
    }

    #[test]
    fn test_drag_respects_grab_offset_and_zoom() {
        let mut ed = editor_with(Field::qr("code", 50.0, 50.0).with_size(40));
        ed.viewport_mut().set_zoom(2.0);
        // Device (140, 140) is content (70, 70), inside the 50..90 box.
        ed.pointer_down(PointerEvent::primary(140.0, 140.0));
        ed.pointer_move(PointerEvent::primary(160.0, 120.0));
        assert_eq!((ed.fields()[0].x, ed.fields()[0].y), (60.0, 40.0));
    }

    #[test]
    fn test_resize_drag_clamps() {
        let mut ed = editor_with(Field::text("t", 10.0, 10.0).with_demo("Hi").with_size(20));
        assert_eq!(
            ed.pointer_down(PointerEvent::primary(15.0, 15.0).with_resize()),
            Outcome::ResizeStarted { index: 0 }
        );
        assert_eq!(
            ed.pointer_move(PointerEvent::primary(15.0, 35.0)),
            Outcome::Resized { index: 0, size: 30 }
        );
        ed.pointer_move(PointerEvent::primary(15.0, 1000.0));
        assert_eq!(ed.fields()[0].size_metric(), TEXT_SIZE_RANGE.1);
        ed.pointer_move(PointerEvent::primary(15.0, -1000.0));
        assert_eq!(ed.fields()[0].size_metric(), TEXT_SIZE_RANGE.0);
    }

    #[test]
    fn test_secondary_button_pans() {
        let mut ed = editor();
        assert_eq!(ed.pointer_down(PointerEvent::secondary(100.0, 100.0)), Outcome::PanStarted);
        ed.pointer_move(PointerEvent::secondary(130.0, 90.0));
        assert_eq!(ed.viewport().pan(), Point::new(30.0, -10.0));
        ed.pointer_up(PointerEvent::secondary(130.0, 90.0));
        assert_eq!(ed.state(), InteractionState::Idle);
        assert_eq!(ed.viewport().zoom(), 1.0);
    }

    #[test]
    fn test_click_on_empty_requests_name_then_creates() {
        let mut ed = editor();
        ed.set_tool(FieldType::Qr);
        let outcome = ed.pointer_down(PointerEvent::primary(30.0, 40.0));
        assert_eq!(outcome, Outcome::NameRequested { at: Point::new(30.0, 40.0) });
        // Events are ignored while the prompt is open.
        assert_eq!(ed.pointer_down(PointerEvent::primary(1.0, 1.0)), Outcome::Ignored);

        let index = ed.submit_field_name(Some("  ticket ")).unwrap();
        assert_eq!(index, Some(0));
        let field = &ed.fields()[0];
        assert_eq!(field.name, "ticket");
        assert_eq!(field.field_type(), FieldType::Qr);
        assert_eq!((field.x, field.y), (30.0, 40.0));
        assert!(ed.bindings().contains("ticket"));
        assert_eq!(ed.selected(), Some(0));
    }

    #[test]
    fn test_cancelled_or_blank_name_creates_nothing() {
        let mut ed = editor();
        ed.pointer_down(PointerEvent::primary(30.0, 40.0));
        assert_eq!(ed.submit_field_name(None).unwrap(), None);
        assert_eq!(ed.state(), InteractionState::Idle);

        ed.pointer_down(PointerEvent::primary(30.0, 40.0));
        assert_eq!(ed.submit_field_name(Some("   ")).unwrap(), None);
        assert!(ed.fields().is_empty());
        assert!(ed.bindings().is_empty());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut ed = editor_with(Field::text("name", 500.0, 500.0));
        ed.pointer_down(PointerEvent::primary(10.0, 10.0));
        assert!(ed.submit_field_name(Some("name")).is_err());
        assert_eq!(ed.fields().len(), 1);
        assert_eq!(ed.state(), InteractionState::Idle);
    }

    #[test]
    fn test_sync_prompt() {
        let mut ed = editor();
        ed.pointer_down(PointerEvent::primary(5.0, 6.0));
        let mut prompt = |at: Point| Some(format!("field_{}_{}", at.x, at.y));
        let index = ed.resolve_name_prompt(&mut prompt).unwrap();
        assert_eq!(index, Some(0));
        assert_eq!(ed.fields()[0].name, "field_5_6");
    }

    #[test]
    fn test_hover_only_hints() {
        let mut ed = editor_with(Field::qr("code", 0.0, 0.0).with_size(40));
        let before = ed.fields().to_vec();
        assert_eq!(
            ed.pointer_move(PointerEvent::primary(10.0, 10.0)),
            Outcome::Hover { cursor: CursorHint::Move }
        );
        assert_eq!(
            ed.pointer_move(PointerEvent::primary(100.0, 100.0)),
            Outcome::Hover { cursor: CursorHint::Crosshair }
        );
        assert_eq!(ed.fields(), &before[..]);
    }

    #[test]
    fn test_wheel_over_field_resizes() {
        let mut ed = editor_with(Field::qr("code", 0.0, 0.0).with_size(40));
        assert_eq!(ed.wheel(10.0, 10.0, -1.0), WheelOutcome::Consumed { index: 0, size: 42 });
        assert_eq!(ed.wheel(10.0, 10.0, 3.0), WheelOutcome::Consumed { index: 0, size: 40 });
        assert_eq!(ed.wheel(100.0, 100.0, -1.0), WheelOutcome::PassThrough);

        ed.fields_mut_for_test()[0].set_size_metric(QR_SIZE_RANGE.1 as i64);
        assert_eq!(
            ed.wheel(10.0, 10.0, -1.0),
            WheelOutcome::Consumed { index: 0, size: QR_SIZE_RANGE.1 }
        );
    }

    #[test]
    fn test_pointer_up_when_idle_is_ignored() {
        let mut ed = editor();
        assert_eq!(ed.pointer_up(PointerEvent::primary(0.0, 0.0)), Outcome::Ignored);
    }
}
