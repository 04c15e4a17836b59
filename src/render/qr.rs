//! QR bitmap generation.
//!
//! The pipeline only depends on [`QrGenerator`]; [`QrCodeGenerator`] is the
//! default implementation on top of the `qrcode` crate.

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

use crate::field::Color;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR code generation failed: {0}")]
    Encode(String),

    #[error("QR size must be at least 1px")]
    ZeroSize,
}

/// Produces a square QR bitmap for a value.
#[async_trait]
pub trait QrGenerator: Send + Sync {
    /// `background: None` leaves light modules transparent.
    async fn generate(
        &self,
        text: &str,
        size_px: u32,
        foreground: Color,
        background: Option<Color>,
    ) -> Result<RgbaImage, QrError>;
}

/// `qrcode`-backed generator.
#[derive(Debug, Clone, Copy)]
pub struct QrCodeGenerator {
    pub error_level: EcLevel,
    /// Light border around the symbol, in modules.
    pub quiet_zone: usize,
}

impl Default for QrCodeGenerator {
    fn default() -> Self {
        Self {
            error_level: EcLevel::M,
            quiet_zone: 1,
        }
    }
}

impl QrCodeGenerator {
    /// Synchronous core of [`QrGenerator::generate`].
    pub fn render(
        &self,
        text: &str,
        size_px: u32,
        foreground: Color,
        background: Option<Color>,
    ) -> Result<RgbaImage, QrError> {
        if size_px == 0 {
            return Err(QrError::ZeroSize);
        }
        let code = QrCode::with_error_correction_level(text, self.error_level)
            .map_err(|e| QrError::Encode(e.to_string()))?;

        let modules = code.width();
        let total = modules + 2 * self.quiet_zone;
        let size = size_px as usize;
        let dark = foreground.to_rgba(255);
        let light = background.map_or(Rgba([0, 0, 0, 0]), |c| c.to_rgba(255));

        let mut img = RgbaImage::new(size_px, size_px);
        for py in 0..size {
            let my = py * total / size;
            for px in 0..size {
                let mx = px * total / size;
                let is_dark = mx >= self.quiet_zone
                    && my >= self.quiet_zone
                    && mx - self.quiet_zone < modules
                    && my - self.quiet_zone < modules
                    && code[(mx - self.quiet_zone, my - self.quiet_zone)] == qrcode::Color::Dark;
                img.put_pixel(px as u32, py as u32, if is_dark { dark } else { light });
            }
        }
        Ok(img)
    }
}

#[async_trait]
impl QrGenerator for QrCodeGenerator {
    async fn generate(
        &self,
        text: &str,
        size_px: u32,
        foreground: Color,
        background: Option<Color>,
    ) -> Result<RgbaImage, QrError> {
        self.render(text, size_px, foreground, background)
    }
}
