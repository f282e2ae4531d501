//! Action-protocol parsing for model responses.
//!
//! The model speaks plain text with zero or more in-band
//! `<ACTION>[{...}]</ACTION>` blocks carrying JSON action payloads. This
//! module handles both views of that stream: [`filter_stream`] produces the
//! text safe to display while tokens are still arriving, and
//! [`parse_response`] runs the full extraction over the completed response.
//!
//! Extraction is deliberately forgiving: models wrap payloads in markdown
//! fences, truncate closing brackets, and emit markdown despite instructions.
//! One malformed action object is recorded and skipped without losing its
//! siblings.

use std::sync::LazyLock;

use inkpad_types::Action;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Placeholder the model uses to reference the reply it is currently writing.
pub const LAST_RESPONSE_MARKER: &str = "{{LAST_RESPONSE}}";
/// Placeholder referencing the assistant's previous reply.
pub const PREVIOUS_RESPONSE_MARKER: &str = "{{PREVIOUS_RESPONSE}}";

const ACTION_OPEN: &str = "<ACTION>";
const ACTION_CLOSE: &str = "</ACTION>";

/// A complete or stream-truncated action block; group 1 is the payload.
static ACTION_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<ACTION>(.*?)(?:</ACTION>|$)").expect("valid regex"));

/// Bare action JSON, for responses that drop the tags entirely.
static BARE_ACTION_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{.*"type"\s*:\s*"(?:create|update)_(?:note|todo|map_note)".*\}"#)
        .expect("valid regex")
});

static MD_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static MD_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static MD_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\*\s+").expect("valid regex"));
static MD_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#{1,6}\s*").expect("valid regex"));

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[a-zA-Z]*\s*").expect("valid regex"));
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```$").expect("valid regex"));

/// The display-safe projection of a partially received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamView {
    /// Text to show in the chat bubble, markdown scrubbed and trimmed.
    pub visible: String,
    /// True once an `<ACTION>` start has been seen; the UI switches from
    /// "answering" to "organizing" and freezes the visible text.
    pub organizing: bool,
}

/// Filters the accumulated stream buffer down to displayable text.
///
/// Complete action blocks are removed wherever they appear; an unterminated
/// block truncates the visible text at its opening tag.
pub fn filter_stream(buffer: &str) -> StreamView {
    let organizing = buffer.contains(ACTION_OPEN);

    let mut visible = buffer.to_string();
    while let Some(open) = visible.find(ACTION_OPEN) {
        match visible[open..].find(ACTION_CLOSE) {
            Some(close) => {
                visible.replace_range(open..open + close + ACTION_CLOSE.len(), "");
            }
            None => {
                visible.truncate(open);
                break;
            }
        }
    }

    StreamView {
        visible: scrub_markdown(&visible).trim().to_string(),
        organizing,
    }
}

/// Strips the markdown the model emits despite being told not to: bold and
/// emphasis markers drop, `*` bullets normalize to `- `, `#` heading runs
/// vanish.
pub fn scrub_markdown(text: &str) -> String {
    let text = MD_BOLD.replace_all(text, "$1");
    let text = MD_EMPHASIS.replace_all(&text, "$1");
    let text = MD_BULLET.replace_all(&text, "- ");
    MD_HEADING.replace_all(&text, "").into_owned()
}

/// Result of the final extraction over a completed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Conversational text with action blocks removed and markdown scrubbed.
    pub display_text: String,
    /// Successfully extracted actions, in response order.
    pub actions: Vec<Action>,
    /// Human-readable notes for payloads that could not be parsed.
    pub errors: Vec<String>,
}

/// Runs the full extraction pipeline over a completed response.
///
/// `previous` is the assistant's prior reply, used to resolve
/// `{{PREVIOUS_RESPONSE}}` content markers.
pub fn parse_response(raw: &str, previous: Option<&str>) -> ParsedResponse {
    let mut parsed = ParsedResponse::default();

    let payloads: Vec<String> = ACTION_BLOCK
        .captures_iter(raw)
        .map(|c| c[1].trim().to_string())
        .collect();

    if payloads.is_empty() {
        parse_untagged(raw, previous, &mut parsed);
    } else {
        let display = ACTION_BLOCK.replace_all(raw, "");
        parsed.display_text = scrub_markdown(display.trim()).trim().to_string();

        for payload in payloads {
            parse_payload(&payload, previous, &mut parsed);
        }
    }

    // Stray tags from half-formed blocks never reach the user.
    parsed.display_text = parsed
        .display_text
        .replace(ACTION_OPEN, "")
        .replace(ACTION_CLOSE, "")
        .trim()
        .to_string();

    // A model sometimes puts the entire answer inside the action and leaves
    // the bubble empty; echo the created content back in that case.
    if parsed.display_text.is_empty()
        && let Some(first) = parsed.actions.first()
        && first.is_create()
    {
        parsed.display_text = first.content().to_string();
    }

    parsed
}

/// Fallback path for responses that emit action JSON without the tags.
/// Parse failures here are silently ignored.
fn parse_untagged(raw: &str, previous: Option<&str>, parsed: &mut ParsedResponse) {
    let Some(found) = BARE_ACTION_JSON.find(raw) else {
        parsed.display_text = scrub_markdown(raw).trim().to_string();
        return;
    };

    let display = format!("{}{}", &raw[..found.start()], &raw[found.end()..]);
    parsed.display_text = scrub_markdown(display.trim()).trim().to_string();

    if let Ok(value) = serde_json::from_str::<Value>(found.as_str()) {
        match extract_action(&value, &parsed.display_text, previous) {
            Ok(Some(action)) => parsed.actions.push(action),
            Ok(None) | Err(_) => {}
        }
    }
}

/// Parses one tag payload: fence stripping, bracket repair, then per-object
/// extraction. Payloads may be a single object or an array.
fn parse_payload(payload: &str, previous: Option<&str>, parsed: &mut ParsedResponse) {
    let mut json = payload.to_string();
    if json.starts_with("```") {
        json = FENCE_OPEN.replace(&json, "").into_owned();
        json = FENCE_CLOSE.replace(&json, "").trim().to_string();
    }

    // Stream truncation routinely eats the closing bracket.
    if json.starts_with('[') {
        if !json.ends_with(']') {
            json.push(']');
        }
    } else if !json.ends_with('}') {
        json.push('}');
    }

    let value: Value = match serde_json::from_str(&json) {
        Ok(value) => value,
        Err(err) => {
            parsed
                .errors
                .push(format!("Couldn't read an action block ({err}): {payload}"));
            return;
        }
    };

    let objects: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    for object in objects {
        match extract_action(object, &parsed.display_text, previous) {
            Ok(Some(action)) => parsed.actions.push(action),
            Ok(None) => {}
            Err(err) => parsed.errors.push(err),
        }
    }
}

/// Maps one JSON object to an [`Action`], resolving content markers first.
///
/// Unknown action types are dropped without an error; structurally invalid
/// objects (wrong field types, update without an id) return one.
fn extract_action(
    value: &Value,
    display_text: &str,
    previous: Option<&str>,
) -> Result<Option<Action>, String> {
    let Some(type_name) = value.get("type").and_then(Value::as_str) else {
        return Err(format!("Action object has no type: {value}"));
    };

    if !matches!(
        type_name,
        "create_note" | "create_todo" | "create_map_note" | "update_note" | "update_todo"
    ) {
        debug!(type_name, "ignoring unknown action type");
        return Ok(None);
    }

    let mut value = value.clone();
    if let Some(content) = value.get_mut("content")
        && let Value::String(text) = content
    {
        *content = Value::String(resolve_marker(text, display_text, previous));
    }

    serde_json::from_value::<Action>(value.clone())
        .map(Some)
        .map_err(|err| format!("Couldn't apply a {type_name} action ({err})"))
}

/// Resolves a content field that is exactly one of the reference markers.
/// Anything else, including markers embedded in longer text, passes through
/// verbatim.
fn resolve_marker(content: &str, display_text: &str, previous: Option<&str>) -> String {
    match content.trim() {
        LAST_RESPONSE_MARKER => display_text.to_string(),
        PREVIOUS_RESPONSE_MARKER => previous.unwrap_or(display_text).to_string(),
        _ => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_stream_plain_text_passes_through() {
        let view = filter_stream("Sure, here is the plan.");
        assert_eq!(view.visible, "Sure, here is the plan.");
        assert!(!view.organizing);
    }

    #[test]
    fn test_filter_stream_hides_complete_block() {
        let view = filter_stream("Done!<ACTION>[{\"type\":\"create_todo\"}]</ACTION> More.");
        assert_eq!(view.visible, "Done! More.");
        assert!(view.organizing);
    }

    #[test]
    fn test_filter_stream_truncates_at_open_tag() {
        let view = filter_stream("Saving that now.<ACTION>[{\"type\":\"crea");
        assert_eq!(view.visible, "Saving that now.");
        assert!(view.organizing);
    }

    #[test]
    fn test_filter_stream_partial_tag_prefix_stays_visible() {
        // "<ACT" could still become a tag, but visibility only changes once
        // the full opener has arrived.
        let view = filter_stream("Okay.<ACT");
        assert_eq!(view.visible, "Okay.<ACT");
        assert!(!view.organizing);
    }

    #[test]
    fn test_scrub_markdown() {
        let scrubbed = scrub_markdown("## Plan\n**bold** and *soft*\n  * item one");
        assert_eq!(scrubbed, "Plan\nbold and soft\n- item one");
    }

    #[test]
    fn test_parse_response_extracts_action_after_text() {
        let raw = "Hello!<ACTION>[{\"type\":\"create_note\",\"title\":\"T\",\"content\":\"C\"}]</ACTION>";
        let parsed = parse_response(raw, None);
        assert_eq!(parsed.display_text, "Hello!");
        assert_eq!(
            parsed.actions,
            vec![Action::CreateNote {
                title: "T".to_string(),
                content: "C".to_string()
            }]
        );
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_parse_response_preserves_action_order_across_blocks() {
        let raw = "First stop.<ACTION>{\"type\":\"create_todo\",\"content\":\"a\"}</ACTION>\
                   Second stop.<ACTION>{\"type\":\"create_todo\",\"content\":\"b\"}</ACTION>";
        let parsed = parse_response(raw, None);
        assert_eq!(parsed.display_text, "First stop.Second stop.");
        assert_eq!(
            parsed.actions,
            vec![
                Action::CreateTodo {
                    content: "a".to_string()
                },
                Action::CreateTodo {
                    content: "b".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_response_repairs_truncated_array() {
        let raw = "Noted.<ACTION>[{\"type\":\"create_todo\",\"content\":\"x\"}";
        let parsed = parse_response(raw, None);
        assert_eq!(
            parsed.actions,
            vec![Action::CreateTodo {
                content: "x".to_string()
            }]
        );
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_parse_response_strips_markdown_fence() {
        let raw = "Ok.<ACTION>```json\n{\"type\":\"create_todo\",\"content\":\"x\"}\n```</ACTION>";
        let parsed = parse_response(raw, None);
        assert_eq!(
            parsed.actions,
            vec![Action::CreateTodo {
                content: "x".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_response_skips_malformed_object_keeps_rest() {
        let raw = "Both.<ACTION>[{\"type\":\"update_note\",\"title\":\"no id\"},\
                   {\"type\":\"create_todo\",\"content\":\"kept\"}]</ACTION>";
        let parsed = parse_response(raw, None);
        assert_eq!(
            parsed.actions,
            vec![Action::CreateTodo {
                content: "kept".to_string()
            }]
        );
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].contains("update_note"));
    }

    #[test]
    fn test_parse_response_resolves_markers() {
        let raw = "The answer text.<ACTION>[\
                   {\"type\":\"create_note\",\"title\":\"A\",\"content\":\"{{LAST_RESPONSE}}\"},\
                   {\"type\":\"create_note\",\"title\":\"B\",\"content\":\"{{PREVIOUS_RESPONSE}}\"}\
                   ]</ACTION>";
        let parsed = parse_response(raw, Some("earlier reply"));
        assert_eq!(parsed.actions[0].content(), "The answer text.");
        assert_eq!(parsed.actions[1].content(), "earlier reply");
    }

    #[test]
    fn test_parse_response_marker_without_previous_falls_back_to_display() {
        let raw = "Here.<ACTION>{\"type\":\"create_note\",\"content\":\"{{PREVIOUS_RESPONSE}}\"}</ACTION>";
        let parsed = parse_response(raw, None);
        assert_eq!(parsed.actions[0].content(), "Here.");
    }

    #[test]
    fn test_parse_response_embedded_marker_passes_through_verbatim() {
        let raw = "Hi.<ACTION>{\"type\":\"create_note\",\"content\":\"see {{LAST_RESPONSE}} above\"}</ACTION>";
        let parsed = parse_response(raw, None);
        assert_eq!(parsed.actions[0].content(), "see {{LAST_RESPONSE}} above");
    }

    #[test]
    fn test_parse_response_bare_json_fallback() {
        let raw = "Saving. {\"type\":\"create_todo\",\"content\":\"bare\"}";
        let parsed = parse_response(raw, None);
        assert_eq!(parsed.display_text, "Saving.");
        assert_eq!(
            parsed.actions,
            vec![Action::CreateTodo {
                content: "bare".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_response_unknown_type_dropped_silently() {
        let raw = "Hm.<ACTION>{\"type\":\"delete_everything\"}</ACTION>";
        let parsed = parse_response(raw, None);
        assert!(parsed.actions.is_empty());
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.display_text, "Hm.");
    }

    #[test]
    fn test_parse_response_blank_display_echoes_create_content() {
        let raw = "<ACTION>{\"type\":\"create_note\",\"title\":\"T\",\"content\":\"the body\"}</ACTION>";
        let parsed = parse_response(raw, None);
        assert_eq!(parsed.display_text, "the body");
    }

    #[test]
    fn test_parse_response_defaults_missing_note_title() {
        let raw = "Ok.<ACTION>{\"type\":\"create_note\",\"content\":\"c\"}</ACTION>";
        let parsed = parse_response(raw, None);
        assert_eq!(
            parsed.actions,
            vec![Action::CreateNote {
                title: "New Note".to_string(),
                content: "c".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_response_map_note_accepts_short_field_name() {
        let raw = "Go.<ACTION>{\"type\":\"create_map_note\",\"location\":\"Old Town\",\"content\":\"walk\"}</ACTION>";
        let parsed = parse_response(raw, None);
        assert_eq!(
            parsed.actions,
            vec![Action::CreateMapNote {
                location_name: "Old Town".to_string(),
                content: "walk".to_string()
            }]
        );
    }
}
