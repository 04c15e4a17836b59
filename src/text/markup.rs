//! Inline formatting markers.
//!
//! Four markers are recognised: `**bold**`, `*italic*`, `__underline__` and
//! `~~strikethrough~~`. Each marker is one global, non-overlapping sweep over
//! the text left by the sweeps before it; the sweep removes the marker
//! characters and flags what they enclosed, so a run can carry several styles
//! at once. Unbalanced markers never match and stay literal.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern is valid"));
static UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+?)__").expect("underline pattern is valid"));
static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~(.+?)~~").expect("strikethrough pattern is valid"));

/// Style flags carried by a span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl SpanStyle {
    pub const PLAIN: SpanStyle = SpanStyle {
        bold: false,
        italic: false,
        underline: false,
        strikethrough: false,
    };

    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::PLAIN
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::PLAIN
        }
    }
}

/// A run of visible text with uniform style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    pub fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, SpanStyle::PLAIN)
    }
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl Marker {
    /// Sweep order. Bold runs before italic so `**` is never read as two `*`.
    const ALL: [Marker; 4] = [
        Marker::Bold,
        Marker::Italic,
        Marker::Underline,
        Marker::Strikethrough,
    ];

    fn pattern(self) -> &'static Regex {
        match self {
            Marker::Bold => &BOLD,
            Marker::Italic => &ITALIC,
            Marker::Underline => &UNDERLINE,
            Marker::Strikethrough => &STRIKETHROUGH,
        }
    }

    fn apply(self, mut style: SpanStyle) -> SpanStyle {
        match self {
            Marker::Bold => style.bold = true,
            Marker::Italic => style.italic = true,
            Marker::Underline => style.underline = true,
            Marker::Strikethrough => style.strikethrough = true,
        }
        style
    }

    /// Strip every match of this marker from `text`, flagging the inner
    /// bytes. `styles` holds one entry per byte of `text`.
    fn sweep(self, text: &str, styles: &[SpanStyle]) -> (String, Vec<SpanStyle>) {
        let mut out_text = String::with_capacity(text.len());
        let mut out_styles = Vec::with_capacity(styles.len());
        let mut last = 0;
        for caps in self.pattern().captures_iter(text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out_text.push_str(&text[last..whole.start()]);
            out_styles.extend_from_slice(&styles[last..whole.start()]);
            out_text.push_str(inner.as_str());
            out_styles.extend(styles[inner.range()].iter().map(|s| self.apply(*s)));
            last = whole.end();
        }
        out_text.push_str(&text[last..]);
        out_styles.extend_from_slice(&styles[last..]);
        (out_text, out_styles)
    }
}

/// Parse raw field text into styled spans.
///
/// Never fails. Text without markers (including the empty string) comes back
/// as a single plain span.
pub fn parse(raw: &str) -> Vec<Span> {
    let mut text = raw.to_string();
    let mut styles = vec![SpanStyle::PLAIN; text.len()];
    for marker in Marker::ALL {
        (text, styles) = marker.sweep(&text, &styles);
    }

    let mut spans: Vec<Span> = Vec::new();
    for (i, ch) in text.char_indices() {
        let style = styles[i];
        match spans.last_mut() {
            Some(span) if span.style == style => span.text.push(ch),
            _ => spans.push(Span::new(ch.to_string(), style)),
        }
    }
    if spans.is_empty() {
        spans.push(Span::plain(""));
    }
    spans
}

/// Concatenated visible text of a span list.
pub fn visible_text(spans: &[Span]) -> String {
    spans.iter().map(|span| span.text.as_str()).collect()
}
