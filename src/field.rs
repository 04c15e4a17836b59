//! # Field Model
//!
//! A field is a positioned overlay on the template: either a line of
//! formatted text or a QR symbol. Fields are joined to data columns by name.
//!
//! Size metrics are clamped on every write: text sizes to
//! [`TEXT_SIZE_RANGE`], QR sides to [`QR_SIZE_RANGE`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive font size range for text fields, in pixels.
pub const TEXT_SIZE_RANGE: (u32, u32) = (8, 72);

/// Inclusive side length range for QR fields, in pixels.
pub const QR_SIZE_RANGE: (u32, u32) = (20, 200);

/// Family identifier of the built-in bitmap font.
pub const DEFAULT_FONT_FAMILY: &str = "spleen";

/// An opaque RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb`, or the short form `#rgb`.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    out[i] = v * 17;
                }
                Some(Self::rgb(out[0], out[1], out[2]))
            }
            _ => None,
        }
    }

    pub fn to_rgba(self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, alpha])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse_hex(&value).ok_or_else(|| format!("invalid color '{}'", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Horizontal alignment of a text field relative to its anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Left edge of a run of the given width anchored at `x`.
    pub fn start_x(self, x: f32, width: f32) -> f32 {
        match self {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Some(Align::Left),
            "center" | "centre" => Some(Align::Center),
            "right" => Some(Align::Right),
            _ => None,
        }
    }
}

/// Style attributes of a text field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size_px: u32,
    pub font_family: String,
    pub color: Color,
    #[serde(default)]
    pub align: Align,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size_px: 24,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            color: Color::BLACK,
            align: Align::Left,
        }
    }
}

/// Style attributes of a QR field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrStyle {
    pub module_size_px: u32,
    pub color: Color,
    /// `None` renders the light modules transparent.
    #[serde(default)]
    pub background: Option<Color>,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            module_size_px: 100,
            color: Color::BLACK,
            background: Some(Color::WHITE),
        }
    }
}

/// Variant-specific part of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text(TextStyle),
    Qr(QrStyle),
}

/// Discriminant of [`FieldKind`], used as the editor's creation tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Qr,
}

/// A positioned, typed overlay bound by name to a data column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub demo_value: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl Field {
    /// Create a field of the given type with default styling.
    pub fn new(field_type: FieldType, name: impl Into<String>, x: f32, y: f32) -> Self {
        let kind = match field_type {
            FieldType::Text => FieldKind::Text(TextStyle::default()),
            FieldType::Qr => FieldKind::Qr(QrStyle::default()),
        };
        Self {
            name: name.into(),
            x,
            y,
            demo_value: String::new(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self::new(FieldType::Text, name, x, y)
    }

    pub fn qr(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self::new(FieldType::Qr, name, x, y)
    }

    /// Builder-style demo value.
    pub fn with_demo(mut self, demo: impl Into<String>) -> Self {
        self.demo_value = demo.into();
        self
    }

    /// Builder-style size metric (clamped).
    pub fn with_size(mut self, size: i64) -> Self {
        self.set_size_metric(size);
        self
    }

    pub fn field_type(&self) -> FieldType {
        match self.kind {
            FieldKind::Text(_) => FieldType::Text,
            FieldKind::Qr(_) => FieldType::Qr,
        }
    }

    /// Font size for text, side length for QR.
    pub fn size_metric(&self) -> u32 {
        match &self.kind {
            FieldKind::Text(style) => style.font_size_px,
            FieldKind::Qr(style) => style.module_size_px,
        }
    }

    /// Inclusive clamp range of [`Field::size_metric`].
    pub fn size_range(&self) -> (u32, u32) {
        match self.kind {
            FieldKind::Text(_) => TEXT_SIZE_RANGE,
            FieldKind::Qr(_) => QR_SIZE_RANGE,
        }
    }

    /// Set the size metric, clamping to the variant's range.
    pub fn set_size_metric(&mut self, size: i64) {
        let (min, max) = self.size_range();
        let clamped = size.clamp(min as i64, max as i64) as u32;
        match &mut self.kind {
            FieldKind::Text(style) => style.font_size_px = clamped,
            FieldKind::Qr(style) => style.module_size_px = clamped,
        }
    }

    /// Re-apply clamps after deserialization.
    pub fn normalize(&mut self) {
        self.set_size_metric(self.size_metric() as i64);
    }

    pub fn as_text(&self) -> Option<&TextStyle> {
        match &self.kind {
            FieldKind::Text(style) => Some(style),
            FieldKind::Qr(_) => None,
        }
    }

    pub fn as_qr(&self) -> Option<&QrStyle> {
        match &self.kind {
            FieldKind::Qr(style) => Some(style),
            FieldKind::Text(_) => None,
        }
    }
}
