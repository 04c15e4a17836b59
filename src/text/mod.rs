//! # Text Formatting Engine
//!
//! Turns raw field text into measured, drawable spans.
//!
//! ```text
//! "Hi **there**" → markup::parse → [Span("Hi "), Span("there", bold)]
//!                                         ↓
//!                     TextLayout::new (FontBook, family, size)
//!                                         ↓
//!              width / span offsets ← hit-test, selection outline
//!                                         ↓
//!                                   layout::render → RgbaImage
//! ```
//!
//! ## Example
//!
//! ```
//! use fieldpress::field::{Align, Color};
//! use fieldpress::text::{FontBook, TextLayout, render};
//!
//! let fonts = FontBook::builtin();
//! let layout = TextLayout::from_markup(&fonts, "Hi **there**", "spleen", 24.0);
//! let mut surface = image::RgbaImage::new(200, 40);
//! let drawn = render(&mut surface, &fonts, &layout, 0.0, 0.0, Color::BLACK, Align::Left);
//! assert_eq!(drawn, layout.width());
//! ```

mod bitmap_font;
pub mod fonts;
pub mod layout;
pub mod markup;
mod ttf_font;

pub use fonts::{CatalogEntry, Face, FontBook, FontFamily, FontSource};
pub use layout::{SpanMetrics, TextLayout, measure, render, span_offsets};
pub use markup::{Span, SpanStyle, parse};
