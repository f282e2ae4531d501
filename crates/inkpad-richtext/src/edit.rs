//! Incremental edits and selection operations over [`StyledText`].
//!
//! Every function here is pure: it takes immutable inputs and returns a new
//! value, so callers may invoke them from any thread.

use crate::color::Color;
use crate::styled::{BULLET_PREFIX, StyleAttribute, StyleRange, StyledText};

/// A caret or selection, in byte offsets. `start == end` means a collapsed
/// caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Inline attributes that toggle over a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStyle {
    Bold,
    Italic,
}

impl InlineStyle {
    fn attribute(self) -> StyleAttribute {
        match self {
            InlineStyle::Bold => StyleAttribute::Bold,
            InlineStyle::Italic => StyleAttribute::Italic,
        }
    }
}

/// Formatting state at a caret, as reported to (and supplied by) the editor
/// toolbar. Freshly typed characters inherit the inline parts of this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveStyles {
    pub bold: bool,
    pub italic: bool,
    pub heading: bool,
    pub list: bool,
    pub color: Option<Color>,
    pub highlight: Option<Color>,
}

/// Re-maps style ranges across a text replacement.
///
/// The edit is located with a common-prefix/common-suffix scan (enough for
/// keystrokes and pastes, no full diff needed). Range endpoints before the
/// prefix stay put, endpoints at or past the old suffix shift by the length
/// delta, and endpoints inside the replaced span collapse to the prefix
/// boundary. Zero-width survivors are dropped. If text was inserted, the new
/// span is tagged with the caller's active inline styles.
pub fn apply_edit(old: &StyledText, new_text: &str, active: &ActiveStyles) -> StyledText {
    let old_text = old.text.as_str();
    let old_bytes = old_text.as_bytes();
    let new_bytes = new_text.as_bytes();

    let min_len = old_bytes.len().min(new_bytes.len());
    let mut prefix = 0;
    while prefix < min_len && old_bytes[prefix] == new_bytes[prefix] {
        prefix += 1;
    }
    // Byte-wise scans can stop inside a multi-byte character; back up to a
    // boundary valid in both strings.
    while prefix > 0 && !(old_text.is_char_boundary(prefix) && new_text.is_char_boundary(prefix)) {
        prefix -= 1;
    }

    let mut old_suffix = old_bytes.len();
    let mut new_suffix = new_bytes.len();
    while old_suffix > prefix
        && new_suffix > prefix
        && old_bytes[old_suffix - 1] == new_bytes[new_suffix - 1]
    {
        old_suffix -= 1;
        new_suffix -= 1;
    }
    while old_suffix < old_bytes.len()
        && !(old_text.is_char_boundary(old_suffix) && new_text.is_char_boundary(new_suffix))
    {
        old_suffix += 1;
        new_suffix += 1;
    }

    let deleted = old_suffix - prefix;
    let inserted = new_suffix - prefix;

    let remap = |p: usize| {
        if p >= old_suffix {
            p - deleted + inserted
        } else if p >= prefix {
            prefix
        } else {
            p
        }
    };

    let mut out = StyledText::plain(new_text);
    for r in &old.ranges {
        out.push_range(remap(r.start), remap(r.end), r.style);
    }

    if inserted > 0 {
        let (s, e) = (prefix, prefix + inserted);
        if active.bold {
            out.push_range(s, e, StyleAttribute::Bold);
        }
        if active.italic {
            out.push_range(s, e, StyleAttribute::Italic);
        }
        if let Some(c) = active.color {
            out.push_range(s, e, StyleAttribute::TextColor(c));
        }
        if let Some(c) = active.highlight {
            out.push_range(s, e, StyleAttribute::Highlight(c));
        }
    }

    out
}

/// Toggles bold/italic over the selection: if a single range of the
/// attribute already covers the whole selection it is removed from exactly
/// that sub-range (splitting at the boundaries), otherwise the attribute is
/// added over the full selection.
pub fn toggle_inline(styled: &StyledText, selection: Selection, style: InlineStyle) -> StyledText {
    let attr = style.attribute();
    let covered = styled
        .ranges
        .iter()
        .any(|r| r.style == attr && r.start <= selection.start && r.end >= selection.end);

    if covered {
        remove_ranges(styled, selection.start, selection.end, |s| *s == attr)
    } else {
        let mut out = styled.clone();
        out.push_range(selection.start, selection.end, attr);
        out
    }
}

/// Toggles the heading attribute on the line containing the selection start.
/// The unit of effect is the whole line, not the selection.
pub fn toggle_heading(styled: &StyledText, selection: Selection) -> StyledText {
    let line_start = styled.line_start(selection.start);
    let line_end = styled.line_end(line_start);

    let exists = styled.ranges.iter().any(|r| {
        r.style == StyleAttribute::Heading && r.start <= line_start && r.end >= line_end
    });

    if exists {
        remove_ranges(styled, line_start, line_end, |s| {
            *s == StyleAttribute::Heading
        })
    } else {
        let mut out = styled.clone();
        out.push_range(line_start, line_end, StyleAttribute::Heading);
        out
    }
}

/// Toggles the literal bullet prefix on the line containing the caret,
/// shifting every range on or after the insertion point and re-mapping the
/// caret. Returns the new text and collapsed caret.
pub fn toggle_list(styled: &StyledText, selection: Selection) -> (StyledText, Selection) {
    let line_start = styled.line_start(selection.start);

    if styled.text[line_start..].starts_with(BULLET_PREFIX) {
        remove_bullet(styled, line_start, selection.start)
    } else {
        add_bullet(styled, line_start, selection.start)
    }
}

fn remove_bullet(styled: &StyledText, index: usize, cursor: usize) -> (StyledText, Selection) {
    let width = BULLET_PREFIX.len();
    let mut out = StyledText::plain(format!(
        "{}{}",
        &styled.text[..index],
        &styled.text[index + width..]
    ));

    let shift = |p: usize| {
        if p >= index + width {
            p - width
        } else if p > index {
            index
        } else {
            p
        }
    };
    for r in &styled.ranges {
        out.push_range(shift(r.start), shift(r.end), r.style);
    }

    let new_cursor = if cursor > index + width {
        cursor - width
    } else if cursor > index {
        index
    } else {
        cursor
    };
    (out, Selection::caret(new_cursor))
}

fn add_bullet(styled: &StyledText, index: usize, cursor: usize) -> (StyledText, Selection) {
    let width = BULLET_PREFIX.len();
    let mut out = StyledText::plain(format!(
        "{}{BULLET_PREFIX}{}",
        &styled.text[..index],
        &styled.text[index..]
    ));

    let shift = |p: usize| if p >= index { p + width } else { p };
    for r in &styled.ranges {
        out.push_range(shift(r.start), shift(r.end), r.style);
    }

    let new_cursor = if cursor >= index { cursor + width } else { cursor };
    (out, Selection::caret(new_cursor))
}

/// Sets (or with `None`, clears) the text color over the selection. Any
/// existing color range intersecting the selection is stripped first,
/// splitting at the boundaries.
pub fn set_color(styled: &StyledText, selection: Selection, color: Option<Color>) -> StyledText {
    set_paint(styled, selection, color, false)
}

/// Sets (or clears) the highlight over the selection.
pub fn set_highlight(
    styled: &StyledText,
    selection: Selection,
    color: Option<Color>,
) -> StyledText {
    set_paint(styled, selection, color, true)
}

fn set_paint(
    styled: &StyledText,
    selection: Selection,
    color: Option<Color>,
    highlight: bool,
) -> StyledText {
    if selection.is_collapsed() {
        return styled.clone();
    }

    let mut out = remove_ranges(styled, selection.start, selection.end, |s| {
        if highlight {
            s.is_highlight()
        } else {
            s.is_text_color()
        }
    });

    if let Some(c) = color {
        let attr = if highlight {
            StyleAttribute::Highlight(c)
        } else {
            StyleAttribute::TextColor(c)
        };
        out.push_range(selection.start, selection.end, attr);
    }

    out
}

/// Rebuilds the range list with every range matching `pred` cut out of
/// `[start, end)`, splitting overlapping ranges at the boundaries.
fn remove_ranges(
    styled: &StyledText,
    start: usize,
    end: usize,
    pred: impl Fn(&StyleAttribute) -> bool,
) -> StyledText {
    let mut out = StyledText::plain(styled.text.clone());
    for r in &styled.ranges {
        if pred(&r.style) && r.start < end && r.end > start {
            if r.start < start {
                out.push_range(r.start, start, r.style);
            }
            if r.end > end {
                out.push_range(end, r.end, r.style);
            }
        } else {
            out.ranges.push(*r);
        }
    }
    out
}

/// Reports the formatting active at the caret: the attributes covering the
/// character immediately before it (or offset 0 at document start), plus the
/// line-level list and heading flags.
pub fn active_styles(styled: &StyledText, cursor: usize) -> ActiveStyles {
    let cursor = cursor.min(styled.text.len());
    let check = if cursor == 0 {
        0
    } else {
        let mut i = cursor - 1;
        while i > 0 && !styled.text.is_char_boundary(i) {
            i -= 1;
        }
        i
    };

    let mut active = ActiveStyles::default();
    for r in styled.ranges_at(check) {
        match r.style {
            StyleAttribute::Bold => active.bold = true,
            StyleAttribute::Italic => active.italic = true,
            StyleAttribute::Heading => active.heading = true,
            StyleAttribute::TextColor(c) => active.color = Some(c),
            StyleAttribute::Highlight(c) => active.highlight = Some(c),
        }
    }

    let line_start = styled.line_start(cursor);
    if styled.text[line_start..].starts_with(BULLET_PREFIX) {
        active.list = true;
    }

    active
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bolded(text: &str, start: usize, end: usize) -> StyledText {
        let mut styled = StyledText::plain(text);
        styled.push_range(start, end, StyleAttribute::Bold);
        styled
    }

    fn assert_ranges_valid(styled: &StyledText) {
        for r in &styled.ranges {
            assert!(r.start < r.end, "zero-width range survived: {r:?}");
            assert!(r.end <= styled.text.len(), "range past end: {r:?}");
        }
    }

    #[test]
    fn test_apply_edit_insertion_shifts_later_ranges() {
        let styled = bolded("hello world", 6, 11);
        let edited = apply_edit(&styled, "hello brave world", &ActiveStyles::default());
        assert_eq!(
            edited.ranges,
            vec![StyleRange {
                start: 12,
                end: 17,
                style: StyleAttribute::Bold
            }]
        );
        assert_ranges_valid(&edited);
    }

    #[test]
    fn test_apply_edit_deletion_collapses_inner_endpoints() {
        // Deleting "llo" cuts into the bold range; its start collapses to
        // the prefix boundary and the tail shifts left with the text.
        let styled = bolded("hello world", 3, 8);
        let edited = apply_edit(&styled, "he world", &ActiveStyles::default());
        assert_eq!(
            edited.ranges,
            vec![StyleRange {
                start: 2,
                end: 5,
                style: StyleAttribute::Bold
            }]
        );
        assert_ranges_valid(&edited);
    }

    #[test]
    fn test_apply_edit_drops_range_emptied_by_spanning_deletion() {
        // The deletion swallows everything between the surviving prefix and
        // suffix; the bold range collapses to zero width and goes away.
        let styled = bolded("hello world", 3, 8);
        let edited = apply_edit(&styled, "herld", &ActiveStyles::default());
        assert!(edited.ranges.is_empty());
        assert_ranges_valid(&edited);
    }

    #[test]
    fn test_apply_edit_drops_fully_deleted_ranges() {
        let styled = bolded("abcdef", 2, 4);
        let edited = apply_edit(&styled, "abef", &ActiveStyles::default());
        assert!(edited.ranges.is_empty());
        assert_ranges_valid(&edited);
    }

    #[test]
    fn test_apply_edit_tags_insertion_with_active_styles() {
        let styled = StyledText::plain("ab");
        let active = ActiveStyles {
            bold: true,
            color: Some(Color(0xFFAB_CDEF)),
            ..Default::default()
        };
        let edited = apply_edit(&styled, "aXb", &active);
        assert_eq!(
            edited.ranges,
            vec![
                StyleRange {
                    start: 1,
                    end: 2,
                    style: StyleAttribute::Bold
                },
                StyleRange {
                    start: 1,
                    end: 2,
                    style: StyleAttribute::TextColor(Color(0xFFAB_CDEF))
                },
            ]
        );
    }

    #[test]
    fn test_apply_edit_multibyte_replacement() {
        let styled = bolded("caf\u{e9} au lait", 0, 5);
        let edited = apply_edit(&styled, "caf\u{e8} au lait", &ActiveStyles::default());
        assert_ranges_valid(&edited);
        assert_eq!(edited.text, "caf\u{e8} au lait");
    }

    #[test]
    fn test_toggle_inline_symmetry() {
        let styled = bolded("abcdef", 0, 6);
        let sel = Selection { start: 2, end: 4 };
        let toggled = toggle_inline(&styled, sel, InlineStyle::Bold);
        // Removal splits the covering range at the selection boundaries.
        assert_eq!(
            toggled.ranges,
            vec![
                StyleRange {
                    start: 0,
                    end: 2,
                    style: StyleAttribute::Bold
                },
                StyleRange {
                    start: 4,
                    end: 6,
                    style: StyleAttribute::Bold
                },
            ]
        );

        let back = toggle_inline(&toggled, sel, InlineStyle::Bold);
        for i in 0..6 {
            assert!(
                back.ranges_at(i)
                    .any(|r| r.style == StyleAttribute::Bold),
                "coverage lost at {i}"
            );
        }
    }

    #[test]
    fn test_toggle_heading_targets_line() {
        let styled = StyledText::plain("one\ntwo");
        let toggled = toggle_heading(&styled, Selection::caret(5));
        assert_eq!(
            toggled.ranges,
            vec![StyleRange {
                start: 4,
                end: 7,
                style: StyleAttribute::Heading
            }]
        );
        let back = toggle_heading(&toggled, Selection::caret(5));
        assert!(back.ranges.is_empty());
    }

    #[test]
    fn test_toggle_list_roundtrip_shifts_ranges_and_cursor() {
        let styled = bolded("item", 0, 4);
        let width = BULLET_PREFIX.len();

        let (listed, sel) = toggle_list(&styled, Selection::caret(2));
        assert_eq!(listed.text, format!("{BULLET_PREFIX}item"));
        assert_eq!(
            listed.ranges,
            vec![StyleRange {
                start: width,
                end: width + 4,
                style: StyleAttribute::Bold
            }]
        );
        assert_eq!(sel, Selection::caret(2 + width));

        let (back, sel2) = toggle_list(&listed, sel);
        assert_eq!(back.text, "item");
        assert_eq!(back.ranges, styled.ranges);
        assert_eq!(sel2, Selection::caret(2));
    }

    #[test]
    fn test_set_color_replaces_intersecting_color() {
        let mut styled = StyledText::plain("abcdef");
        styled.push_range(0, 6, StyleAttribute::TextColor(Color(0xFF00_0001)));
        styled.push_range(0, 6, StyleAttribute::Bold);

        let sel = Selection { start: 2, end: 4 };
        let painted = set_color(&styled, sel, Some(Color(0xFF00_0002)));

        // Old color split around the selection, bold untouched, new color on
        // the selection.
        assert_eq!(
            painted.ranges,
            vec![
                StyleRange {
                    start: 0,
                    end: 2,
                    style: StyleAttribute::TextColor(Color(0xFF00_0001))
                },
                StyleRange {
                    start: 4,
                    end: 6,
                    style: StyleAttribute::TextColor(Color(0xFF00_0001))
                },
                StyleRange {
                    start: 0,
                    end: 6,
                    style: StyleAttribute::Bold
                },
                StyleRange {
                    start: 2,
                    end: 4,
                    style: StyleAttribute::TextColor(Color(0xFF00_0002))
                },
            ]
        );
    }

    #[test]
    fn test_set_highlight_none_clears() {
        let mut styled = StyledText::plain("abcd");
        styled.push_range(0, 4, StyleAttribute::Highlight(Color(0xFFFF_FF00)));
        let cleared = set_highlight(&styled, Selection { start: 0, end: 4 }, None);
        assert!(cleared.ranges.is_empty());
    }

    #[test]
    fn test_active_styles_looks_before_cursor() {
        let mut styled = StyledText::plain("ab");
        styled.push_range(0, 1, StyleAttribute::Bold);

        assert!(active_styles(&styled, 1).bold);
        assert!(!active_styles(&styled, 2).bold);
        // At document start the first character is consulted.
        assert!(active_styles(&styled, 0).bold);
    }

    #[test]
    fn test_active_styles_reports_list_line() {
        let styled = StyledText::plain(format!("{BULLET_PREFIX}item"));
        assert!(active_styles(&styled, 4).list);
    }
}
