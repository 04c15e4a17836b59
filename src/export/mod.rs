//! # Batch Export
//!
//! Renders one PNG per data row and packs them into an archive.
//!
//! ```text
//! for each row (sequential):
//!     cancelled? ──► Err(Cancelled), no archive
//!     progress (row+1)/total
//!     file name ──► render_row ──► PNG (blocking pool) ──► archive entry
//!     (naming / encoding / insertion failure ⇒ warn!, row skipped)
//!     yield row_yield (cancellable)
//! serialize archive (blocking pool) ──► ExportReport
//! ```
//!
//! The run works on an [`ExportJob`], an owned snapshot of the editor's
//! fields and bindings, so edits made while it runs do not affect it.

pub mod archive;

pub use archive::{ArchiveError, ArchiveWriter, ZipArchiveWriter};

use image::{ImageFormat, RgbaImage};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::binding::{BindingTable, unmapped_fields};
use crate::config::ExportConfig;
use crate::data::{Dataset, Row};
use crate::error::FieldpressError;
use crate::field::Field;
use crate::naming::FileNamingPolicy;
use crate::render::{QrGenerator, render_row};
use crate::template::Template;
use crate::text::FontBook;

/// Everything a batch run reads, detached from the editor.
#[derive(Clone)]
pub struct ExportJob {
    pub template: Arc<Template>,
    pub dataset: Arc<Dataset>,
    pub fields: Vec<Field>,
    pub bindings: BindingTable,
    pub naming: FileNamingPolicy,
    pub fonts: Arc<FontBook>,
}

impl ExportJob {
    /// Refuses a run with no rows or no fields.
    pub fn new(
        template: Arc<Template>,
        dataset: Arc<Dataset>,
        fields: Vec<Field>,
        bindings: BindingTable,
        naming: FileNamingPolicy,
        fonts: Arc<FontBook>,
    ) -> Result<Self, FieldpressError> {
        if dataset.is_empty() {
            return Err(FieldpressError::MissingInput(
                "The data has no rows".to_string(),
            ));
        }
        if fields.is_empty() {
            return Err(FieldpressError::MissingInput(
                "No fields have been placed".to_string(),
            ));
        }
        Ok(Self {
            template,
            dataset,
            fields,
            bindings,
            naming,
            fonts,
        })
    }

    /// Names of fields with no bound column.
    pub fn unmapped(&self) -> Vec<String> {
        unmapped_fields(&self.fields, &self.bindings)
            .into_iter()
            .map(|f| f.name.clone())
            .collect()
    }

    /// Bound or naming columns the data does not have. Fields bound to
    /// them render their demo value and rows fall back to default names.
    pub fn missing_columns(&self) -> Vec<String> {
        let headers = self.dataset.headers();
        let mut missing: Vec<String> = Vec::new();
        let columns = self
            .bindings
            .iter()
            .filter_map(|(_, column)| column)
            .chain(self.naming.source_column.as_deref());
        for column in columns {
            if !headers.iter().any(|h| h == column) && !missing.iter().any(|m| m == column) {
                missing.push(column.to_string());
            }
        }
        missing
    }
}

/// Progress of a running export. `current` is 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
}

pub struct ExportOptions {
    pub row_yield: Duration,
    pub archive_prefix: String,
    pub cancel: CancellationToken,
    pub progress: Option<watch::Sender<ExportProgress>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

impl ExportOptions {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            row_yield: config.row_yield(),
            archive_prefix: config.archive_prefix.clone(),
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: watch::Sender<ExportProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(&self, current: usize, total: usize) {
        if let Some(tx) = &self.progress {
            tx.send_replace(ExportProgress { current, total });
        }
    }
}

/// A row that produced no archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based.
    pub row_number: usize,
    pub reason: String,
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub archive_name: String,
    pub archive: Vec<u8>,
    pub produced: usize,
    pub total: usize,
    pub skipped: Vec<SkippedRow>,
    /// Fields that rendered demo values because they have no column.
    pub unmapped: Vec<String>,
}

/// `<prefix>_YYYY-MM-DD.zip` for today's local date.
pub fn archive_name(prefix: &str) -> String {
    format!("{}_{}.zip", prefix, chrono::Local::now().format("%Y-%m-%d"))
}

/// Run a batch export to completion, cancellation, or archive failure.
pub async fn run_export(
    job: &ExportJob,
    qr: &dyn QrGenerator,
    mut archive: Box<dyn ArchiveWriter>,
    options: &ExportOptions,
) -> Result<ExportReport, FieldpressError> {
    let total = job.dataset.len();
    let unmapped = job.unmapped();
    if !unmapped.is_empty() {
        warn!(fields = ?unmapped, "fields without a column will use their demo values");
    }
    let missing = job.missing_columns();
    if !missing.is_empty() {
        warn!(columns = ?missing, "columns not in the data; demo values and default names apply");
    }
    info!(rows = total, fields = job.fields.len(), "export started");

    let mut skipped = Vec::new();
    for (index, row) in job.dataset.rows().iter().enumerate() {
        if options.cancel.is_cancelled() {
            info!(row = index + 1, "export cancelled");
            return Err(FieldpressError::Cancelled);
        }
        let row_number = index + 1;
        options.report(row_number, total);
        debug!(row = row_number, total, "rendering row");

        if let Err(reason) = export_row(job, qr, archive.as_mut(), row_number, row).await {
            warn!(row = row_number, %reason, "row skipped");
            skipped.push(SkippedRow { row_number, reason });
        }

        if row_number < total {
            tokio::select! {
                _ = options.cancel.cancelled() => {
                    info!(row = row_number, "export cancelled");
                    return Err(FieldpressError::Cancelled);
                }
                _ = tokio::time::sleep(options.row_yield) => {}
            }
        }
    }

    let archive = tokio::task::spawn_blocking(move || archive.serialize())
        .await
        .map_err(|e| FieldpressError::Archive(format!("Task error: {}", e)))?
        .map_err(|e| FieldpressError::Archive(e.to_string()))?;

    let produced = total - skipped.len();
    info!(produced, skipped = skipped.len(), bytes = archive.len(), "export finished");

    Ok(ExportReport {
        archive_name: archive_name(&options.archive_prefix),
        archive,
        produced,
        total,
        skipped,
        unmapped,
    })
}

/// Render, encode, and store one row. Errors carry the skip reason.
async fn export_row(
    job: &ExportJob,
    qr: &dyn QrGenerator,
    archive: &mut dyn ArchiveWriter,
    row_number: usize,
    row: &Row,
) -> Result<(), String> {
    let name = job
        .naming
        .file_name(row_number, row)
        .map_err(|e| e.to_string())?;

    let surface = render_row(
        &job.template,
        &job.fields,
        &job.bindings,
        Some(row),
        &job.fonts,
        qr,
    )
    .await;
    let png = encode_png(surface).await.map_err(|e| e.to_string())?;

    archive.add_entry(&name, png).map_err(|e| e.to_string())
}

/// Encode on the blocking pool. The surface is dropped there.
pub async fn encode_png(surface: RgbaImage) -> Result<Vec<u8>, FieldpressError> {
    tokio::task::spawn_blocking(move || {
        let mut out = Cursor::new(Vec::new());
        surface
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| FieldpressError::Image(format!("PNG encoding failed: {}", e)))?;
        Ok(out.into_inner())
    })
    .await
    .map_err(|e| FieldpressError::Image(format!("Task error: {}", e)))?
}
