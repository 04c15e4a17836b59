//! Font catalog and face selection.
//!
//! A [`FontBook`] maps family identifiers to faces. It is built once from the
//! configured [`FontSource`] list and handed to the editor and every export
//! job; nothing in the crate keeps a global font table. Families the book does
//! not know fall back to the built-in Spleen bitmap family.

use ab_glyph::FontArc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::markup::SpanStyle;
use super::{bitmap_font, ttf_font};
use crate::error::FieldpressError;
use crate::field::DEFAULT_FONT_FAMILY;

/// One `(display name, family identifier)` pair offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub display_name: String,
    pub family: String,
}

/// A configured font family backed by files on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct FontSource {
    /// Display name, e.g. "IBM Plex Sans".
    pub name: String,
    /// Identifier stored in text fields, e.g. "ibm".
    pub family: String,
    pub regular: PathBuf,
    #[serde(default)]
    pub bold: Option<PathBuf>,
    #[serde(default)]
    pub italic: Option<PathBuf>,
    #[serde(default)]
    pub bold_italic: Option<PathBuf>,
}

/// Effects applied at draw time when a family lacks a dedicated variant.
/// Neither changes glyph advances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Synthetic {
    pub bold: bool,
    pub italic: bool,
}

/// Horizontal shear applied by synthetic italics, per pixel above the baseline.
const SYNTHETIC_SLANT: f32 = 0.2;

/// A single face: the built-in bitmap font or a loaded outline font.
#[derive(Clone)]
pub enum Face {
    Bitmap,
    Outline(FontArc),
}

impl Face {
    /// Advance width of `ch`. The only width primitive in the crate: both
    /// measurement and drawing go through it.
    pub fn advance(&self, ch: char, pixel_height: f32) -> f32 {
        match self {
            Face::Bitmap => bitmap_font::advance(pixel_height),
            Face::Outline(font) => ttf_font::advance(font, ch, pixel_height),
        }
    }

    /// Draw `ch` with its line box starting at `(left, top)`.
    pub fn draw_char(
        &self,
        ch: char,
        pixel_height: f32,
        left: f32,
        top: f32,
        synthetic: Synthetic,
        plot: &mut dyn FnMut(i64, i64, f32),
    ) {
        let baseline = top + pixel_height * 0.8;
        let mut slanted = |x: i64, y: i64, coverage: f32| {
            if synthetic.italic {
                let shear = ((baseline - y as f32) * SYNTHETIC_SLANT).round() as i64;
                plot(x.saturating_add(shear), y, coverage);
            } else {
                plot(x, y, coverage);
            }
        };

        let passes: &[f32] = if synthetic.bold { &[0.0, 1.0] } else { &[0.0] };
        for &offset in passes {
            match self {
                Face::Bitmap => {
                    bitmap_font::draw_char(ch, pixel_height, left + offset, top, &mut slanted)
                }
                Face::Outline(font) => {
                    ttf_font::draw_char(font, ch, pixel_height, left + offset, top, &mut slanted)
                }
            }
        }
    }
}

/// Regular face plus whichever styled variants are available.
#[derive(Clone)]
pub struct FontFamily {
    pub regular: Face,
    pub bold: Option<Face>,
    pub italic: Option<Face>,
    pub bold_italic: Option<Face>,
}

impl FontFamily {
    pub fn bitmap() -> Self {
        Self {
            regular: Face::Bitmap,
            bold: None,
            italic: None,
            bold_italic: None,
        }
    }

    fn load(source: &FontSource) -> Result<Self, FieldpressError> {
        let load_opt = |path: &Option<PathBuf>| -> Result<Option<Face>, FieldpressError> {
            path.as_deref()
                .map(|p| ttf_font::load_font(p).map(Face::Outline))
                .transpose()
        };
        Ok(Self {
            regular: Face::Outline(ttf_font::load_font(&source.regular)?),
            bold: load_opt(&source.bold)?,
            italic: load_opt(&source.italic)?,
            bold_italic: load_opt(&source.bold_italic)?,
        })
    }

    /// Face used for a span style, with the effects to synthesize.
    pub fn select(&self, style: SpanStyle) -> (&Face, Synthetic) {
        let synth = |bold, italic| Synthetic { bold, italic };
        match (style.bold, style.italic) {
            (true, true) => {
                if let Some(face) = &self.bold_italic {
                    (face, Synthetic::default())
                } else if let Some(face) = &self.bold {
                    (face, synth(false, true))
                } else if let Some(face) = &self.italic {
                    (face, synth(true, false))
                } else {
                    (&self.regular, synth(true, true))
                }
            }
            (true, false) => match &self.bold {
                Some(face) => (face, Synthetic::default()),
                None => (&self.regular, synth(true, false)),
            },
            (false, true) => match &self.italic {
                Some(face) => (face, Synthetic::default()),
                None => (&self.regular, synth(false, true)),
            },
            (false, false) => (&self.regular, Synthetic::default()),
        }
    }
}

/// Family identifiers mapped to faces, plus the user-facing catalog.
pub struct FontBook {
    catalog: Vec<CatalogEntry>,
    families: HashMap<String, FontFamily>,
    fallback: FontFamily,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FontBook {
    /// A book holding only the built-in bitmap family.
    pub fn builtin() -> Self {
        Self {
            catalog: vec![CatalogEntry {
                display_name: "Spleen Mono".to_string(),
                family: DEFAULT_FONT_FAMILY.to_string(),
            }],
            families: HashMap::new(),
            fallback: FontFamily::bitmap(),
        }
    }

    /// Build a book from configured sources, loading every file.
    pub fn from_sources(sources: &[FontSource]) -> Result<Self, FieldpressError> {
        let mut book = Self::builtin();
        for source in sources {
            let family = FontFamily::load(source)?;
            book.insert(
                CatalogEntry {
                    display_name: source.name.clone(),
                    family: source.family.clone(),
                },
                family,
            );
        }
        Ok(book)
    }

    /// Register (or replace) a family.
    pub fn insert(&mut self, entry: CatalogEntry, family: FontFamily) {
        self.catalog.retain(|e| e.family != entry.family);
        self.families.insert(entry.family.clone(), family);
        self.catalog.push(entry);
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Look a display name back up to its family identifier.
    pub fn family_for_display_name(&self, display_name: &str) -> Option<&str> {
        self.catalog
            .iter()
            .find(|e| e.display_name == display_name)
            .map(|e| e.family.as_str())
    }

    /// Faces for a family identifier; unknown identifiers get the fallback.
    pub fn family(&self, family: &str) -> &FontFamily {
        self.families.get(family).unwrap_or(&self.fallback)
    }
}
