//! Font catalog, template upload, and data upload handlers.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;

use crate::data::Dataset;
use crate::template::Template;
use crate::text::CatalogEntry;

use super::super::state::AppState;
use super::{ApiError, ApiResult};

/// Canvas size assumed when the client does not send one.
const DEFAULT_AVAILABLE: f32 = 800.0;

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub success: bool,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub zoom: f32,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub success: bool,
    pub filename: String,
    pub headers: Vec<String>,
    pub rows: usize,
}

/// Parsed multipart upload: the `file` part plus any text parts.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
    available_width: Option<f32>,
    available_height: Option<f32>,
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut available_width = None;
    let mut available_height = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                file = Some((filename, bytes.to_vec()));
            }
            "available_width" | "available_height" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read {}: {}", name, e)))?;
                let value: f32 = text
                    .trim()
                    .parse()
                    .map_err(|_| ApiError::bad_request(format!("{} must be a number", name)))?;
                if name == "available_width" {
                    available_width = Some(value);
                } else {
                    available_height = Some(value);
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| ApiError::bad_request("No file field found"))?;
    Ok(Upload {
        filename,
        bytes,
        available_width,
        available_height,
    })
}

/// GET /api/fonts - Font catalog.
pub async fn fonts(State(state): State<Arc<AppState>>) -> Json<Vec<CatalogEntry>> {
    Json(state.fonts.catalog().to_vec())
}

/// POST /api/template - Decode and install a template image.
pub async fn template(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<TemplateResponse>> {
    let Upload {
        filename,
        bytes,
        available_width,
        available_height,
    } = read_upload(multipart).await?;

    // Decoding large photos is CPU-bound
    let hint = filename.clone();
    let template = tokio::task::spawn_blocking(move || Template::decode(&bytes, Some(&hint)))
        .await
        .map_err(|e| {
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {}", e))
        })??;

    let (width, height) = (template.width(), template.height());
    let mut editor = state.editor.write().await;
    editor.load_template(
        template,
        available_width.unwrap_or(DEFAULT_AVAILABLE),
        available_height.unwrap_or(DEFAULT_AVAILABLE),
    );

    Ok(Json(TemplateResponse {
        success: true,
        filename,
        width,
        height,
        zoom: editor.viewport().zoom(),
    }))
}

/// POST /api/data - Parse and install a CSV dataset.
pub async fn data(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<DataResponse>> {
    let upload = read_upload(multipart).await?;
    let dataset = Dataset::from_csv_reader(upload.bytes.as_slice())?;

    let headers = dataset.headers().to_vec();
    let rows = dataset.len();
    state.editor.write().await.load_dataset(dataset);

    Ok(Json(DataResponse {
        success: true,
        filename: upload.filename,
        headers,
        rows,
    }))
}
