//! Batch export API handlers.
//!
//! One export runs at a time in a background task. Its progress and final
//! report live in the shared [`ExportSlot`](super::super::state::ExportSlot).

use axum::{
    Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::FieldpressError;
use crate::export::{ExportOptions, ExportProgress, SkippedRow, ZipArchiveWriter, run_export};

use super::super::state::{AppState, ExportOutcome, RunningExport};
use super::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportStatus {
    Idle,
    Running {
        current: usize,
        total: usize,
    },
    Finished {
        archive_name: String,
        produced: usize,
        total: usize,
        skipped: Vec<SkippedRow>,
        unmapped: Vec<String>,
    },
    Cancelled,
    Failed {
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub success: bool,
    pub total: usize,
    /// Fields that will render their demo value in every image.
    pub unmapped: Vec<String>,
}

/// POST /api/export - Start a batch run in the background.
pub async fn start(State(state): State<Arc<AppState>>) -> ApiResult<Json<StartResponse>> {
    let mut slot = state.export.lock().await;
    if slot.running.is_some() {
        return Err(ApiError::conflict("An export is already running"));
    }

    let job = state.editor.read().await.export_job()?;
    let total = job.dataset.len();
    let unmapped = job.unmapped();

    let cancel = CancellationToken::new();
    let (tx, rx) = watch::channel(ExportProgress { current: 0, total });
    let options = ExportOptions::from_config(&state.config.export)
        .with_cancel(cancel.clone())
        .with_progress(tx);

    slot.running = Some(RunningExport {
        cancel,
        progress: rx,
    });
    slot.last = None;
    drop(slot);

    let task_state = state.clone();
    let qr = state.qr.clone();
    let run = tokio::spawn(async move {
        run_export(
            &job,
            qr.as_ref(),
            Box::new(ZipArchiveWriter::new()),
            &options,
        )
        .await
    });

    // The slot is released however the run ends, including a panic.
    tokio::spawn(async move {
        let outcome = match run.await {
            Ok(Ok(report)) => ExportOutcome::Finished(report),
            Ok(Err(FieldpressError::Cancelled)) => ExportOutcome::Cancelled,
            Ok(Err(e)) => {
                warn!(error = %e, "export failed");
                ExportOutcome::Failed(e.to_string())
            }
            Err(e) => {
                error!(error = %e, "export task aborted");
                ExportOutcome::Failed(format!("Export task aborted: {}", e))
            }
        };
        let mut slot = task_state.export.lock().await;
        slot.running = None;
        slot.last = Some(outcome);
    });

    info!(rows = total, "export queued");
    Ok(Json(StartResponse {
        success: true,
        total,
        unmapped,
    }))
}

/// GET /api/export/status - Progress of the running export or the last result.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ExportStatus> {
    let slot = state.export.lock().await;
    let status = match (&slot.running, &slot.last) {
        (Some(running), _) => {
            let progress = *running.progress.borrow();
            ExportStatus::Running {
                current: progress.current,
                total: progress.total,
            }
        }
        (None, Some(ExportOutcome::Finished(report))) => ExportStatus::Finished {
            archive_name: report.archive_name.clone(),
            produced: report.produced,
            total: report.total,
            skipped: report.skipped.clone(),
            unmapped: report.unmapped.clone(),
        },
        (None, Some(ExportOutcome::Cancelled)) => ExportStatus::Cancelled,
        (None, Some(ExportOutcome::Failed(error))) => ExportStatus::Failed {
            error: error.clone(),
        },
        (None, None) => ExportStatus::Idle,
    };
    Json(status)
}

/// POST /api/export/cancel - Cancel the running export.
pub async fn cancel(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let slot = state.export.lock().await;
    let running = slot
        .running
        .as_ref()
        .ok_or_else(|| ApiError::not_found("No export is running"))?;
    running.cancel.cancel();
    Ok(Json(serde_json::json!({"success": true})))
}

/// GET /api/export/download - The last finished archive.
pub async fn download(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let slot = state.export.lock().await;
    let Some(ExportOutcome::Finished(report)) = &slot.last else {
        return Err(ApiError::not_found("No finished export to download"));
    };
    let disposition = format!("attachment; filename=\"{}\"", report.archive_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.archive.clone(),
    ))
}
