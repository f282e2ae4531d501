//! Prompt file helpers.

/// System prompt defining the assistant persona and the action block wire
/// format.
pub const SYSTEM_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/system_prompt.md"
));

/// Prompt template for automatic note-title generation.
pub const TITLE_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/title_prompt.md"
));
