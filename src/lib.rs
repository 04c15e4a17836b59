//! # Fieldpress - Template Field Rendering Library
//!
//! Fieldpress places typed fields (formatted text or QR codes) on top of a
//! template image, previews them against rows of tabular data, and
//! batch-renders one PNG per row into a zip archive. It provides:
//!
//! - **Field model**: text and QR fields with clamped size metrics
//! - **Inline markup**: `**bold**`, `*italic*`, `__underline__`, `~~strike~~`
//! - **Editor session**: hit-testing, drag, resize, pan, and zoom
//! - **Batch export**: sequential, cancellable, progress-reporting
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use fieldpress::{
//!     binding::BindingTable,
//!     data::Dataset,
//!     export::{run_export, ExportJob, ExportOptions, ZipArchiveWriter},
//!     field::Field,
//!     naming::FileNamingPolicy,
//!     render::QrCodeGenerator,
//!     template::Template,
//!     text::FontBook,
//! };
//!
//! # async fn example() -> Result<(), fieldpress::FieldpressError> {
//! let fields = vec![Field::text("greeting", 10.0, 10.0).with_size(20)];
//! let mut bindings = BindingTable::for_fields(&fields);
//! bindings.bind("greeting", Some("name".to_string()))?;
//!
//! let job = ExportJob::new(
//!     Arc::new(Template::open(Path::new("badge.png"))?),
//!     Arc::new(Dataset::from_csv_path(Path::new("people.csv"))?),
//!     fields,
//!     bindings,
//!     FileNamingPolicy::default(),
//!     Arc::new(FontBook::builtin()),
//! )?;
//!
//! let report = run_export(
//!     &job,
//!     &QrCodeGenerator::default(),
//!     Box::new(ZipArchiveWriter::new()),
//!     &ExportOptions::default(),
//! )
//! .await?;
//! std::fs::write(&report.archive_name, &report.archive)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`field`] | Field variants, styles, colors |
//! | [`text`] | Markup parsing, fonts, measurement, drawing |
//! | [`viewport`] | Device to content coordinates |
//! | [`editor`] | Editor session and interaction state machine |
//! | [`binding`] | Field to column bindings, display values |
//! | [`render`] | Per-row rendering, QR generation |
//! | [`export`] | Batch pipeline and archive writing |
//! | [`naming`] | Output file names |
//! | [`server`] | HTTP editor backend |
//! | [`error`] | Error types |

pub mod binding;
pub mod config;
pub mod data;
pub mod editor;
pub mod error;
pub mod export;
pub mod field;
pub mod geometry;
pub mod layout;
pub mod naming;
pub mod raster;
pub mod render;
pub mod server;
pub mod template;
pub mod text;
pub mod viewport;

// Re-exports for convenience
pub use editor::Editor;
pub use error::FieldpressError;
pub use field::{Field, FieldType};
pub use text::FontBook;
