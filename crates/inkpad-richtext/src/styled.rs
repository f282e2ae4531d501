//! Style-annotated text: the in-memory representation the codec targets.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Literal text prefix marking a list line. Tracked structurally, never as a
/// style range.
pub const BULLET_PREFIX: &str = "\u{2022} ";

/// A single style attribute applied to a span of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleAttribute {
    Bold,
    Italic,
    /// Applied to the full extent of a heading line.
    Heading,
    TextColor(Color),
    Highlight(Color),
}

impl StyleAttribute {
    /// True for the color-carrying variants, ignoring the payload.
    pub fn is_text_color(&self) -> bool {
        matches!(self, StyleAttribute::TextColor(_))
    }

    pub fn is_highlight(&self) -> bool {
        matches!(self, StyleAttribute::Highlight(_))
    }
}

/// Half-open byte range `[start, end)` tagged with one attribute.
///
/// Invariant: `0 <= start < end <= text.len()`, both on char boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRange {
    pub start: usize,
    pub end: usize,
    pub style: StyleAttribute,
}

/// A plain-text character sequence paired with unordered, possibly
/// overlapping style ranges.
///
/// All operations on `StyledText` are pure; each edit produces a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledText {
    pub text: String,
    pub ranges: Vec<StyleRange>,
}

impl StyledText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ranges: Vec::new(),
        }
    }

    /// Appends a range, silently dropping anything zero- or negative-width.
    pub fn push_range(&mut self, start: usize, end: usize, style: StyleAttribute) {
        if end > start {
            self.ranges.push(StyleRange { start, end, style });
        }
    }

    /// Ranges covering the character starting at byte `offset`.
    pub fn ranges_at(&self, offset: usize) -> impl Iterator<Item = &StyleRange> {
        self.ranges
            .iter()
            .filter(move |r| r.start <= offset && offset < r.end)
    }

    /// Byte offset of the start of the line containing `offset`.
    pub fn line_start(&self, offset: usize) -> usize {
        let upto = offset.min(self.text.len());
        match self.text[..upto].rfind('\n') {
            Some(nl) => nl + 1,
            None => 0,
        }
    }

    /// Byte offset one past the last character of the line containing
    /// `line_start` (exclusive, not including the newline).
    pub fn line_end(&self, line_start: usize) -> usize {
        match self.text[line_start..].find('\n') {
            Some(nl) => line_start + nl,
            None => self.text.len(),
        }
    }
}
