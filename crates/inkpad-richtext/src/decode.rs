//! Markup → [`StyledText`] decoding.
//!
//! Grammar per line: an optional `"# "` heading or `"- "` list prefix, then
//! inline tokens `**`, standalone `_`, `[color:#AARRGGBB]`, `[/color]`,
//! `[bg:#AARRGGBB]`, `[/bg]`. Malformed input never fails: unterminated tags
//! close implicitly at line end, unmatched closers are dropped.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::color::Color;
use crate::stack::{EntryKind, StackEntry, StyleStack};
use crate::styled::{BULLET_PREFIX, StyleAttribute, StyledText};

static COLOR_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[color:(#[0-9A-Fa-f]{8})\]").expect("valid regex"));
static BG_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[bg:(#[0-9A-Fa-f]{8})\]").expect("valid regex"));

#[derive(Debug, Clone, Copy)]
enum TokenKind {
    BoldMarker,
    ItalicMarker,
    ColorStart(Color),
    ColorEnd,
    BgStart(Color),
    BgEnd,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    pos: usize,
    len: usize,
    kind: TokenKind,
}

/// Decodes a persisted markup string into style-annotated text.
pub fn decode(markup: &str) -> StyledText {
    let mut out = StyledText::default();
    let lines: Vec<&str> = markup.split('\n').collect();

    for (i, line) in lines.iter().enumerate() {
        let line_start = out.text.len();

        if let Some(rest) = line.strip_prefix("# ") {
            decode_line(&mut out, rest);
            // The heading attribute covers the whole decoded line.
            let line_end = out.text.len();
            out.push_range(line_start, line_end, StyleAttribute::Heading);
        } else if let Some(rest) = line.strip_prefix("- ") {
            // List lines keep the rendered bullet glyph as literal text.
            let bulleted = format!("{BULLET_PREFIX}{rest}");
            decode_line(&mut out, &bulleted);
        } else {
            decode_line(&mut out, line);
        }

        if i + 1 < lines.len() {
            out.text.push('\n');
        }
    }

    out
}

fn decode_line(out: &mut StyledText, content: &str) {
    let tokens = tokenize(content);

    let mut stack = StyleStack::new();
    let mut cursor = 0;

    for token in &tokens {
        if token.pos > cursor {
            append_segment(out, &content[cursor..token.pos], &stack);
        }

        match token.kind {
            TokenKind::BoldMarker => stack.toggle(StackEntry::Bold),
            TokenKind::ItalicMarker => stack.toggle(StackEntry::Italic),
            TokenKind::ColorStart(color) => stack.push(StackEntry::TextColor(color)),
            TokenKind::ColorEnd => {
                if !stack.remove_last_of(EntryKind::TextColor) {
                    debug!("dropping unmatched [/color]");
                }
            }
            TokenKind::BgStart(color) => stack.push(StackEntry::Highlight(color)),
            TokenKind::BgEnd => {
                if !stack.remove_last_of(EntryKind::Highlight) {
                    debug!("dropping unmatched [/bg]");
                }
            }
        }

        cursor = token.pos + token.len;
    }

    if cursor < content.len() {
        append_segment(out, &content[cursor..], &stack);
    }
    // Anything still open is implicitly closed at line end.
}

fn append_segment(out: &mut StyledText, segment: &str, stack: &StyleStack) {
    let start = out.text.len();
    out.text.push_str(segment);
    let end = out.text.len();

    for entry in stack.iter() {
        let style = match entry {
            StackEntry::Bold => StyleAttribute::Bold,
            StackEntry::Italic => StyleAttribute::Italic,
            StackEntry::TextColor(c) => StyleAttribute::TextColor(*c),
            StackEntry::Highlight(c) => StyleAttribute::Highlight(*c),
        };
        out.push_range(start, end, style);
    }
}

fn tokenize(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (pos, _) in content.match_indices("**") {
        tokens.push(Token {
            pos,
            len: 2,
            kind: TokenKind::BoldMarker,
        });
    }

    // Standalone underscores only: an `_` touching word characters on both
    // sides is literal text, so identifiers like FISH_200516 survive.
    for (pos, _) in content.match_indices('_') {
        let prev_is_word = content[..pos]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);
        let next_is_word = content[pos + 1..]
            .chars()
            .next()
            .is_some_and(char::is_alphanumeric);
        if !prev_is_word || !next_is_word {
            tokens.push(Token {
                pos,
                len: 1,
                kind: TokenKind::ItalicMarker,
            });
        }
    }

    for caps in COLOR_START.captures_iter(content) {
        let whole = caps.get(0).expect("match group 0");
        let color = Color::parse(&caps[1]).unwrap_or(Color::BLACK);
        tokens.push(Token {
            pos: whole.start(),
            len: whole.len(),
            kind: TokenKind::ColorStart(color),
        });
    }
    for (pos, raw) in content.match_indices("[/color]") {
        tokens.push(Token {
            pos,
            len: raw.len(),
            kind: TokenKind::ColorEnd,
        });
    }

    for caps in BG_START.captures_iter(content) {
        let whole = caps.get(0).expect("match group 0");
        let color = Color::parse(&caps[1]).unwrap_or(Color::BLACK);
        tokens.push(Token {
            pos: whole.start(),
            len: whole.len(),
            kind: TokenKind::BgStart(color),
        });
    }
    for (pos, raw) in content.match_indices("[/bg]") {
        tokens.push(Token {
            pos,
            len: raw.len(),
            kind: TokenKind::BgEnd,
        });
    }

    tokens.sort_by_key(|t| t.pos);
    tokens
}
