//! Request context assembly.
//!
//! Each chat request carries a snapshot of the user's notes and todos plus
//! the recent conversation, so the model can reference real ids in update
//! actions.

use inkpad_types::{ChatMessage, Note, Todo};

/// Number of most recent conversation messages replayed into the prompt.
const HISTORY_WINDOW: usize = 6;

/// Content longer than this is truncated in summary mode.
const SUMMARY_PREVIEW_CHARS: usize = 50;

/// Builds the data snapshot section of the prompt.
///
/// Full contents by default. In summary mode notes contribute their stored
/// summary when one exists, and everything else is truncated to a short
/// preview to keep the prompt small.
pub fn build_snapshot(notes: &[Note], todos: &[Todo], use_summaries: bool) -> String {
    let mut out = String::new();

    out.push_str("Current notes:\n");
    if notes.is_empty() {
        out.push_str("(none)\n");
    }
    for note in notes {
        let body = if use_summaries {
            note.ai_summary
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map_or_else(|| preview(&note.content), str::to_string)
        } else {
            note.content.clone()
        };
        out.push_str(&format!("- [id {}] {}: {}\n", note.id, note.title, body));
    }

    out.push_str("\nCurrent todos:\n");
    if todos.is_empty() {
        out.push_str("(none)\n");
    }
    for todo in todos {
        let state = if todo.is_done { "done" } else { "open" };
        let body = if use_summaries {
            preview(&todo.content)
        } else {
            todo.content.clone()
        };
        out.push_str(&format!("- [id {}] ({state}) {body}\n", todo.id));
    }

    out
}

/// Truncates content on a char boundary for summary mode.
fn preview(content: &str) -> String {
    if content.chars().count() <= SUMMARY_PREVIEW_CHARS {
        return content.to_string();
    }
    let cut: String = content.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    format!("{cut}...")
}

/// Renders the trailing conversation window, oldest first.
pub fn build_history(history: &[ChatMessage]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut out = String::new();
    for msg in &history[start..] {
        let role = if msg.is_user { "User" } else { "Assistant" };
        out.push_str(&format!("{role}: {}\n", msg.content));
    }
    out
}

/// Assembles the full user prompt sent with a chat request.
pub fn build_user_prompt(
    notes: &[Note],
    todos: &[Todo],
    history: &[ChatMessage],
    question: &str,
    use_summaries: bool,
) -> String {
    let snapshot = build_snapshot(notes, todos, use_summaries);
    let conversation = build_history(history);

    let mut out = String::new();
    out.push_str(&snapshot);
    if !conversation.is_empty() {
        out.push_str("\nRecent conversation:\n");
        out.push_str(&conversation);
    }
    out.push_str("\nUser question: ");
    out.push_str(question);
    out
}
