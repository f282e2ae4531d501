//! Style stack used by the decoder.
//!
//! Mirrors HTML-like non-strict nesting: bold and italic toggle membership,
//! while color/highlight tags push on open and remove the most recent entry
//! of their type on close, regardless of interleaving. `[/color]` therefore
//! closes the nearest open color even inside `[bg:…]…[/bg]`.

use crate::color::Color;

/// An entry currently open on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEntry {
    Bold,
    Italic,
    TextColor(Color),
    Highlight(Color),
}

/// Entry type, disregarding any color payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Bold,
    Italic,
    TextColor,
    Highlight,
}

impl StackEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            StackEntry::Bold => EntryKind::Bold,
            StackEntry::Italic => EntryKind::Italic,
            StackEntry::TextColor(_) => EntryKind::TextColor,
            StackEntry::Highlight(_) => EntryKind::Highlight,
        }
    }
}

/// Ordered collection of open styles, oldest first.
#[derive(Debug, Clone, Default)]
pub struct StyleStack {
    entries: Vec<StackEntry>,
}

impl StyleStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles membership: removes the first equal entry if present,
    /// otherwise pushes. Used for bold/italic markers.
    pub fn toggle(&mut self, entry: StackEntry) {
        if let Some(pos) = self.entries.iter().position(|e| *e == entry) {
            self.entries.remove(pos);
        } else {
            self.entries.push(entry);
        }
    }

    /// Pushes an open tag. Used for color/highlight starts.
    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    /// Removes the most recent entry of `kind`. A no-op when none is open,
    /// which is how unmatched closing tags degrade.
    pub fn remove_last_of(&mut self, kind: EntryKind) -> bool {
        if let Some(pos) = self.entries.iter().rposition(|e| e.kind() == kind) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StackEntry> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut stack = StyleStack::new();
        stack.toggle(StackEntry::Bold);
        assert_eq!(stack.iter().count(), 1);
        stack.toggle(StackEntry::Bold);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_remove_last_of_type_skips_other_kinds() {
        let mut stack = StyleStack::new();
        stack.push(StackEntry::Highlight(Color(0xFFFF_0000)));
        stack.push(StackEntry::TextColor(Color(0xFF00_FF00)));
        stack.toggle(StackEntry::Bold);

        assert!(stack.remove_last_of(EntryKind::Highlight));
        let remaining: Vec<_> = stack.iter().copied().collect();
        assert_eq!(
            remaining,
            vec![StackEntry::TextColor(Color(0xFF00_FF00)), StackEntry::Bold]
        );
    }

    #[test]
    fn test_remove_last_of_takes_most_recent() {
        let mut stack = StyleStack::new();
        stack.push(StackEntry::TextColor(Color(0xFF00_0001)));
        stack.push(StackEntry::TextColor(Color(0xFF00_0002)));

        assert!(stack.remove_last_of(EntryKind::TextColor));
        let remaining: Vec<_> = stack.iter().copied().collect();
        assert_eq!(remaining, vec![StackEntry::TextColor(Color(0xFF00_0001))]);
    }

    #[test]
    fn test_unmatched_close_is_noop() {
        let mut stack = StyleStack::new();
        stack.toggle(StackEntry::Italic);
        assert!(!stack.remove_last_of(EntryKind::TextColor));
        assert_eq!(stack.iter().count(), 1);
    }

    #[test]
    fn test_interleaved_color_inside_highlight() {
        // [bg:X][color:Y]…[/bg] leaves the color open: [/bg] only pops the
        // highlight even though the color was pushed later.
        let mut stack = StyleStack::new();
        stack.push(StackEntry::Highlight(Color(0xFF11_1111)));
        stack.push(StackEntry::TextColor(Color(0xFF22_2222)));
        assert!(stack.remove_last_of(EntryKind::Highlight));
        let remaining: Vec<_> = stack.iter().copied().collect();
        assert_eq!(remaining, vec![StackEntry::TextColor(Color(0xFF22_2222))]);
    }
}
