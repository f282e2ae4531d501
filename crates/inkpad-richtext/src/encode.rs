//! [`StyledText`] → markup encoding.
//!
//! Tag nesting order is fixed: Highlight (outermost) → TextColor → Bold →
//! Italic (innermost). Whenever an outer layer's active value changes at a
//! character boundary, every inner layer is closed and reopened inside the
//! new outer tag, so the output is well-nested even when the in-memory
//! ranges are not.

use crate::color::Color;
use crate::styled::{BULLET_PREFIX, StyleAttribute, StyledText};

/// Encodes style-annotated text back into the persisted markup dialect.
pub fn encode(styled: &StyledText) -> String {
    let mut sb = String::new();
    let mut offset = 0;
    let lines: Vec<&str> = styled.text.split('\n').collect();

    for (i, line) in lines.iter().enumerate() {
        let line_end = offset + line.len();

        let is_heading = !line.is_empty()
            && styled.ranges.iter().any(|r| {
                r.style == StyleAttribute::Heading && r.start <= offset && r.end >= line_end
            });
        let is_list = line.starts_with(BULLET_PREFIX);

        if is_heading {
            sb.push_str("# ");
        }
        let mut content_start = offset;
        if is_list {
            sb.push_str("- ");
            content_start += BULLET_PREFIX.len();
        }

        reconstruct_line(styled, content_start, line_end, &mut sb);

        if i + 1 < lines.len() {
            sb.push('\n');
        }
        offset = line_end + 1;
    }

    sb
}

#[derive(Default, Clone, Copy, PartialEq)]
struct LineState {
    highlight: Option<Color>,
    color: Option<Color>,
    bold: bool,
    italic: bool,
}

fn reconstruct_line(styled: &StyledText, start: usize, end: usize, sb: &mut String) {
    let mut active = LineState::default();

    for (rel, ch) in styled.text[start..end].char_indices() {
        let pos = start + rel;

        let mut next = LineState::default();
        for r in styled.ranges_at(pos) {
            match r.style {
                StyleAttribute::Bold => next.bold = true,
                StyleAttribute::Italic => next.italic = true,
                // Last one wins when color ranges overlap.
                StyleAttribute::TextColor(c) => next.color = Some(c),
                StyleAttribute::Highlight(c) => next.highlight = Some(c),
                StyleAttribute::Heading => {}
            }
        }

        transition(&mut active, next, sb);
        sb.push(ch);
    }

    close_all(&mut active, sb);
}

/// Emits the close/reopen tags taking `active` to `next`. A change in an
/// outer layer dirties every layer inside it, forcing inner tags to close
/// and reopen within the new outer tag even when their own value is
/// unchanged.
fn transition(active: &mut LineState, next: LineState, sb: &mut String) {
    let mut dirty = false;

    // Layer 1: highlight (outermost).
    if active.highlight != next.highlight {
        close_italic(active, sb);
        close_bold(active, sb);
        close_color(active, sb);
        if active.highlight.take().is_some() {
            sb.push_str("[/bg]");
        }
        if let Some(c) = next.highlight {
            sb.push_str(&format!("[bg:{}]", c.to_hex()));
            active.highlight = Some(c);
        }
        dirty = true;
    }

    // Layer 2: text color.
    if dirty || active.color != next.color {
        close_italic(active, sb);
        close_bold(active, sb);
        close_color(active, sb);
        if let Some(c) = next.color {
            sb.push_str(&format!("[color:{}]", c.to_hex()));
            active.color = Some(c);
        }
        dirty = true;
    }

    // Layer 3: bold.
    if dirty || active.bold != next.bold {
        close_italic(active, sb);
        close_bold(active, sb);
        if next.bold {
            sb.push_str("**");
            active.bold = true;
        }
        dirty = true;
    }

    // Layer 4: italic (innermost).
    if dirty || active.italic != next.italic {
        close_italic(active, sb);
        if next.italic {
            sb.push('_');
            active.italic = true;
        }
    }
}

fn close_all(active: &mut LineState, sb: &mut String) {
    close_italic(active, sb);
    close_bold(active, sb);
    close_color(active, sb);
    if active.highlight.take().is_some() {
        sb.push_str("[/bg]");
    }
}

fn close_italic(active: &mut LineState, sb: &mut String) {
    if active.italic {
        sb.push('_');
        active.italic = false;
    }
}

fn close_bold(active: &mut LineState, sb: &mut String) {
    if active.bold {
        sb.push_str("**");
        active.bold = false;
    }
}

fn close_color(active: &mut LineState, sb: &mut String) {
    if active.color.take().is_some() {
        sb.push_str("[/color]");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::styled::StyleRange;

    #[test]
    fn test_encode_bold() {
        let mut styled = StyledText::plain("a b c");
        styled.push_range(2, 3, StyleAttribute::Bold);
        assert_eq!(encode(&styled), "a **b** c");
    }

    #[test]
    fn test_encode_heading_and_list() {
        let mut styled = StyledText::plain("Title\n\u{2022} item");
        styled.push_range(0, 5, StyleAttribute::Heading);
        assert_eq!(encode(&styled), "# Title\n- item");
    }

    #[test]
    fn test_encode_nests_color_outside_bold() {
        let mut styled = StyledText::plain("hot");
        styled.push_range(0, 3, StyleAttribute::TextColor(Color(0xFFFF_0000)));
        styled.push_range(0, 3, StyleAttribute::Bold);
        assert_eq!(encode(&styled), "[color:#FFFF0000]**hot**[/color]");
    }

    #[test]
    fn test_encode_repairs_non_nested_ranges() {
        // Bold [0,2) and highlight [1,3) overlap without nesting; the
        // serializer must close and reopen bold inside the highlight tag.
        let mut styled = StyledText::plain("abc");
        styled.push_range(0, 2, StyleAttribute::Bold);
        styled.push_range(1, 3, StyleAttribute::Highlight(Color(0xFFFF_FF00)));
        assert_eq!(encode(&styled), "**a**[bg:#FFFFFF00]**b**c[/bg]");
    }

    #[test]
    fn test_encode_inner_reopens_when_outer_changes() {
        // Italic spans the whole line while the color changes midway; the
        // italic tag must close and reopen inside each color tag.
        let mut styled = StyledText::plain("ab");
        styled.push_range(0, 2, StyleAttribute::Italic);
        styled.push_range(0, 1, StyleAttribute::TextColor(Color(0xFF00_0001)));
        styled.push_range(1, 2, StyleAttribute::TextColor(Color(0xFF00_0002)));
        assert_eq!(
            encode(&styled),
            "[color:#FF000001]_a_[/color][color:#FF000002]_b_[/color]"
        );
    }

    #[test]
    fn test_decode_encode_roundtrip() {
        let cases = [
            "plain",
            "a **b** c",
            "# Heading\nbody",
            "- one\n- two",
            "x[color:#FFFF0000]red **bold red**[/color]",
            "[bg:#FF00FF00][color:#FF0000FF]both[/color][/bg]",
            "_lead_ and **tail**",
            "mixed\n# head **b**\n- li _i_",
        ];
        for case in cases {
            let styled = decode(case);
            assert_eq!(decode(&encode(&styled)), styled, "case: {case}");
        }
    }

    #[test]
    fn test_encode_idempotent_after_normalization() {
        // encode(decode(encode(x))) == encode(x): encoding normalizes
        // overlapping ranges to a canonical nesting that survives another
        // decode/encode cycle. Boundaries sit at word edges so the italic
        // underscores stay standalone.
        let mut styled = StyledText::plain("a b c");
        styled.push_range(0, 3, StyleAttribute::Bold);
        styled.push_range(2, 5, StyleAttribute::Italic);
        styled.push_range(0, 5, StyleAttribute::Highlight(Color(0xFF12_3456)));

        let first = encode(&styled);
        let second = encode(&decode(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn test_roundtrip_preserves_range_set() {
        let styled = decode("**a _b_ c**");
        let again = decode(&encode(&styled));
        assert_eq!(
            again.ranges,
            vec![
                StyleRange {
                    start: 0,
                    end: 2,
                    style: StyleAttribute::Bold
                },
                StyleRange {
                    start: 2,
                    end: 3,
                    style: StyleAttribute::Bold
                },
                StyleRange {
                    start: 2,
                    end: 3,
                    style: StyleAttribute::Italic
                },
                StyleRange {
                    start: 3,
                    end: 5,
                    style: StyleAttribute::Bold
                },
            ]
        );
    }
}
