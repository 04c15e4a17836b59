//! Server state and configuration.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, watch};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::editor::Editor;
use crate::export::{ExportProgress, ExportReport};
use crate::render::{QrCodeGenerator, QrGenerator};
use crate::text::FontBook;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

/// A batch run in flight.
pub struct RunningExport {
    pub cancel: CancellationToken,
    pub progress: watch::Receiver<ExportProgress>,
}

/// How the last batch run ended.
pub enum ExportOutcome {
    Finished(ExportReport),
    Cancelled,
    Failed(String),
}

/// At most one running export, plus the result of the previous one.
#[derive(Default)]
pub struct ExportSlot {
    pub running: Option<RunningExport>,
    pub last: Option<ExportOutcome>,
}

/// Application state shared across handlers.
pub struct AppState {
    pub editor: RwLock<Editor>,
    pub export: Mutex<ExportSlot>,
    pub fonts: Arc<FontBook>,
    pub qr: Arc<dyn QrGenerator>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, fonts: Arc<FontBook>) -> Self {
        let editor = Editor::new(fonts.clone(), config.viewport);
        Self {
            editor: RwLock::new(editor),
            export: Mutex::new(ExportSlot::default()),
            fonts,
            qr: Arc::new(QrCodeGenerator::default()),
            config,
        }
    }

    /// Replace the QR generator used for previews and exports.
    pub fn with_qr(mut self, qr: Arc<dyn QrGenerator>) -> Self {
        self.qr = qr;
        self
    }
}
