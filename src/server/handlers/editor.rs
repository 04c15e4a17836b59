//! Editor session API handlers.
//!
//! Every mutating endpoint answers with the outcome of the call plus a fresh
//! [`EditorSnapshot`], so the client never has to re-fetch state.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::binding::BindingTable;
use crate::editor::{Editor, FieldPatch, InteractionState, Outcome, PointerEvent, WheelOutcome};
use crate::export::encode_png;
use crate::field::{Field, FieldType};
use crate::layout::Layout;
use crate::naming::FileNamingPolicy;
use crate::viewport::Viewport;

use super::super::state::AppState;
use super::{ApiError, ApiResult};

/// Everything the client needs to draw the editor.
#[derive(Debug, Serialize)]
pub struct EditorSnapshot {
    pub fields: Vec<Field>,
    pub bindings: BindingTable,
    /// Selected field index, or -1.
    pub selected: i64,
    pub state: InteractionState,
    pub tool: FieldType,
    pub viewport: Viewport,
    pub template_size: Option<(u32, u32)>,
    pub headers: Vec<String>,
    pub rows: usize,
    pub preview_row: usize,
    pub display_values: Vec<String>,
    pub unmapped: Vec<String>,
    pub naming: FileNamingPolicy,
}

impl EditorSnapshot {
    pub fn of(editor: &Editor) -> Self {
        let dataset = editor.dataset();
        Self {
            fields: editor.fields().to_vec(),
            bindings: editor.bindings().clone(),
            selected: editor.selected().map_or(-1, |i| i as i64),
            state: editor.state(),
            tool: editor.tool(),
            viewport: *editor.viewport(),
            template_size: editor.template().map(|t| (t.width(), t.height())),
            headers: dataset.map(|d| d.headers().to_vec()).unwrap_or_default(),
            rows: dataset.map_or(0, |d| d.len()),
            preview_row: editor.preview_row(),
            display_values: editor.display_values(),
            unmapped: editor
                .unmapped_fields()
                .into_iter()
                .map(|f| f.name.clone())
                .collect(),
            naming: editor.naming_policy().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EditorReply<T: Serialize> {
    pub success: bool,
    pub result: T,
    pub editor: EditorSnapshot,
}

fn reply<T: Serialize>(editor: &Editor, result: T) -> Json<EditorReply<T>> {
    Json(EditorReply {
        success: true,
        result,
        editor: EditorSnapshot::of(editor),
    })
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Deserialize)]
pub struct PointerRequest {
    pub phase: PointerPhase,
    #[serde(flatten)]
    pub event: PointerEvent,
}

#[derive(Debug, Deserialize)]
pub struct WheelRequest {
    pub x: f32,
    pub y: f32,
    pub delta_y: f32,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomAction {
    In,
    Out,
    Fit,
    Actual,
}

#[derive(Debug, Deserialize)]
pub struct ZoomRequest {
    pub action: ZoomAction,
    #[serde(default)]
    pub available_width: f32,
    #[serde(default)]
    pub available_height: f32,
}

#[derive(Debug, Deserialize)]
pub struct ToolRequest {
    pub kind: FieldType,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRowRequest {
    pub row: usize,
}

#[derive(Debug, Deserialize)]
pub struct BindingRequest {
    #[serde(default)]
    pub column: Option<String>,
}

/// GET /api/editor - Current editor state.
pub async fn snapshot(State(state): State<Arc<AppState>>) -> Json<EditorSnapshot> {
    Json(EditorSnapshot::of(&*state.editor.read().await))
}

/// POST /api/editor/pointer - Feed one pointer event to the state machine.
pub async fn pointer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PointerRequest>,
) -> Json<EditorReply<Outcome>> {
    let mut editor = state.editor.write().await;
    let outcome = match req.phase {
        PointerPhase::Down => editor.pointer_down(req.event),
        PointerPhase::Move => editor.pointer_move(req.event),
        PointerPhase::Up => editor.pointer_up(req.event),
    };
    reply(&editor, outcome)
}

/// POST /api/editor/wheel - Resize the field under the pointer.
pub async fn wheel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WheelRequest>,
) -> Json<EditorReply<WheelOutcome>> {
    let mut editor = state.editor.write().await;
    let outcome = editor.wheel(req.x, req.y, req.delta_y);
    reply(&editor, outcome)
}

/// POST /api/editor/name - Answer a pending field name request.
pub async fn name(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NameRequest>,
) -> ApiResult<Json<EditorReply<Option<usize>>>> {
    let mut editor = state.editor.write().await;
    let index = editor.submit_field_name(req.name.as_deref())?;
    Ok(reply(&editor, index))
}

/// POST /api/editor/zoom - Zoom controls.
pub async fn zoom(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ZoomRequest>,
) -> ApiResult<Json<EditorReply<f32>>> {
    let mut editor = state.editor.write().await;
    match req.action {
        ZoomAction::In => editor.viewport_mut().zoom_in(),
        ZoomAction::Out => editor.viewport_mut().zoom_out(),
        ZoomAction::Actual => editor.viewport_mut().actual_size(),
        ZoomAction::Fit => {
            let (width, height) = editor
                .template()
                .map(|t| (t.width() as f32, t.height() as f32))
                .ok_or_else(|| ApiError::bad_request("No template loaded"))?;
            editor
                .viewport_mut()
                .fit(width, height, req.available_width, req.available_height);
        }
    }
    let zoom = editor.viewport().zoom();
    Ok(reply(&editor, zoom))
}

/// POST /api/editor/tool - Choose the kind of field new clicks create.
pub async fn tool(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToolRequest>,
) -> Json<EditorReply<FieldType>> {
    let mut editor = state.editor.write().await;
    editor.set_tool(req.kind);
    reply(&editor, req.kind)
}

/// POST /api/editor/preview-row - Pick the data row the preview shows.
pub async fn preview_row(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRowRequest>,
) -> Json<EditorReply<usize>> {
    let mut editor = state.editor.write().await;
    editor.set_preview_row(req.row);
    let row = editor.preview_row();
    reply(&editor, row)
}

/// PUT /api/fields/:index - Partial property update.
pub async fn update_field(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(patch): Json<FieldPatch>,
) -> ApiResult<Json<EditorReply<usize>>> {
    let mut editor = state.editor.write().await;
    editor.update_field(index, patch)?;
    Ok(reply(&editor, index))
}

/// DELETE /api/fields/:index - Remove a field and its binding.
pub async fn delete_field(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> ApiResult<Json<EditorReply<Field>>> {
    let mut editor = state.editor.write().await;
    let field = editor.remove_field(index)?;
    Ok(reply(&editor, field))
}

/// PUT /api/fields/:index/binding - Bind or unbind a column.
pub async fn bind_field(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(req): Json<BindingRequest>,
) -> ApiResult<Json<EditorReply<usize>>> {
    let mut editor = state.editor.write().await;
    editor.bind_field(index, req.column)?;
    Ok(reply(&editor, index))
}

/// PUT /api/naming - Replace the file naming policy.
pub async fn naming(
    State(state): State<Arc<AppState>>,
    Json(policy): Json<FileNamingPolicy>,
) -> Json<EditorReply<FileNamingPolicy>> {
    let mut editor = state.editor.write().await;
    editor.set_naming_policy(policy.clone());
    reply(&editor, policy)
}

/// GET /api/layout - Fields, bindings, and naming as a layout document.
pub async fn get_layout(State(state): State<Arc<AppState>>) -> Json<Layout> {
    Json(state.editor.read().await.layout())
}

/// PUT /api/layout - Replace fields, bindings, and naming.
pub async fn put_layout(
    State(state): State<Arc<AppState>>,
    Json(layout): Json<Layout>,
) -> ApiResult<Json<EditorReply<usize>>> {
    let mut editor = state.editor.write().await;
    editor.apply_layout(layout)?;
    let count = editor.fields().len();
    Ok(reply(&editor, count))
}

/// GET /api/preview - PNG of the preview row with editor markers.
pub async fn preview(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let image = {
        let editor = state.editor.read().await;
        editor.render_preview(state.qr.as_ref()).await?
    };
    let png = encode_png(image).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
