//! # Configuration
//!
//! Optional JSON file passed with `--config`. Every section and member has a
//! default, so an empty object (or no file at all) is a valid configuration.
//!
//! ```json
//! {
//!   "viewport": { "min_zoom": 0.1, "max_zoom": 5.0, "zoom_step": 1.2 },
//!   "export": { "row_yield_ms": 10, "archive_prefix": "generated_images" },
//!   "fonts": [
//!     { "name": "IBM Plex Sans", "family": "ibm", "regular": "fonts/IBMPlexSans-Regular.ttf" }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::FieldpressError;
use crate::text::{FontBook, FontSource};
use crate::viewport::ViewportConfig;

/// Batch run tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Pause between rows so other tasks get scheduled.
    pub row_yield_ms: u64,
    /// Archive names are `<prefix>_YYYY-MM-DD.zip`.
    pub archive_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            row_yield_ms: 10,
            archive_prefix: "generated_images".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn row_yield(&self) -> Duration {
        Duration::from_millis(self.row_yield_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewport: ViewportConfig,
    pub export: ExportConfig,
    pub fonts: Vec<FontSource>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, FieldpressError> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| FieldpressError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, FieldpressError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            FieldpressError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, FieldpressError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), FieldpressError> {
        let vp = &self.viewport;
        if !(vp.min_zoom > 0.0 && vp.min_zoom <= vp.max_zoom) {
            return Err(FieldpressError::Config(format!(
                "viewport zoom range {}..{} is invalid",
                vp.min_zoom, vp.max_zoom
            )));
        }
        if vp.zoom_step <= 1.0 {
            return Err(FieldpressError::Config(
                "viewport.zoom_step must be greater than 1".to_string(),
            ));
        }
        if self.export.archive_prefix.trim().is_empty() {
            return Err(FieldpressError::Config(
                "export.archive_prefix cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Built-in family plus every configured font.
    pub fn font_book(&self) -> Result<FontBook, FieldpressError> {
        FontBook::from_sources(&self.fonts)
    }
}
