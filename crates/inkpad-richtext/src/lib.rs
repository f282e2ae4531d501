//! Rich-text codec for the note editor.
//!
//! Notes persist as a compact markup dialect (`**bold**`, standalone
//! `_italic_`, `# ` headings, `- ` list lines, `[color:#AARRGGBB]` and
//! `[bg:#AARRGGBB]` tags). This crate converts between that dialect and
//! [`StyledText`], and provides the pure editing operations the UI layer
//! drives: diff-based range re-mapping after a text change, style toggles,
//! color application, and active-style queries at the caret.

mod color;
mod decode;
mod edit;
mod encode;
mod stack;
mod styled;

pub use color::Color;
pub use decode::decode;
pub use edit::{
    ActiveStyles, InlineStyle, Selection, active_styles, apply_edit, set_color, set_highlight,
    toggle_heading, toggle_inline, toggle_list,
};
pub use encode::encode;
pub use styled::{BULLET_PREFIX, StyleAttribute, StyleRange, StyledText};
