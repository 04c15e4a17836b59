//! Template image loading.
//!
//! Any raster format the `image` crate decodes is accepted. HEIC/HEIF photos
//! need the `heif` feature (libheif).

use image::{DynamicImage, RgbaImage};
use std::path::Path;

use crate::error::FieldpressError;

/// A decoded template: the background every output image starts from.
#[derive(Debug, Clone)]
pub struct Template {
    image: RgbaImage,
}

impl Template {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Decode template bytes. `filename` is only a format hint.
    pub fn decode(bytes: &[u8], filename: Option<&str>) -> Result<Self, FieldpressError> {
        let lower = filename.map(str::to_lowercase).unwrap_or_default();
        let img = if is_heic(bytes) || lower.ends_with(".heic") || lower.ends_with(".heif") {
            decode_heic(bytes)?
        } else {
            image::load_from_memory(bytes)
                .map_err(|e| FieldpressError::Image(format!("Failed to decode template: {}", e)))?
        };
        if img.width() == 0 || img.height() == 0 {
            return Err(FieldpressError::Image("Template has no pixels".to_string()));
        }
        Ok(Self {
            image: img.to_rgba8(),
        })
    }

    pub fn open(path: &Path) -> Result<Self, FieldpressError> {
        let bytes = std::fs::read(path).map_err(|e| {
            FieldpressError::Image(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::decode(&bytes, path.file_name().and_then(|n| n.to_str()))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Check the ISO-BMFF brand for HEIC/HEIF/AVIF containers.
fn is_heic(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }

    // HEIC files start with a box size (4 bytes) followed by "ftyp" (bytes 4-7)
    if &data[4..8] != b"ftyp" {
        return false;
    }

    let brand = &data[8..12];
    matches!(
        brand,
        b"heic"
            | b"heix"
            | b"hevc"
            | b"hevx"
            | b"heim"
            | b"heis"
            | b"hevm"
            | b"hevs"
            | b"mif1"
            | b"msf1"
    )
}

#[cfg(feature = "heif")]
fn decode_heic(data: &[u8]) -> Result<DynamicImage, FieldpressError> {
    use image::RgbImage;
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let heif_err = |what: &str, e: libheif_rs::HeifError| {
        FieldpressError::Image(format!("Failed to {} HEIC: {}", what, e))
    };

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data).map_err(|e| heif_err("read", e))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| heif_err("open primary image of", e))?;
    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| heif_err("decode", e))?;

    let planes = image.planes();
    let interleaved = planes
        .interleaved
        .ok_or_else(|| FieldpressError::Image("No interleaved RGB data in HEIC".to_string()))?;

    let width = image.width();
    let height = image.height();
    let stride = interleaved.stride;
    let data = interleaved.data;

    let mut rgb_image = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let offset = (y as usize * stride) + (x as usize * 3);
            if offset + 2 < data.len() {
                rgb_image.put_pixel(
                    x,
                    y,
                    image::Rgb([data[offset], data[offset + 1], data[offset + 2]]),
                );
            }
        }
    }

    Ok(DynamicImage::ImageRgb8(rgb_image))
}

#[cfg(not(feature = "heif"))]
fn decode_heic(_data: &[u8]) -> Result<DynamicImage, FieldpressError> {
    Err(FieldpressError::Image(
        "HEIC/HEIF templates need the `heif` feature".to_string(),
    ))
}
