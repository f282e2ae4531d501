//! Conversation types: messages, structured actions, loading state, sessions.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A structured command extracted from a model response.
///
/// `content` fields are fully resolved by the time an `Action` is constructed;
/// the `{{LAST_RESPONSE}}` / `{{PREVIOUS_RESPONSE}}` reference markers never
/// survive past extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    CreateNote {
        #[serde(default = "default_note_title")]
        title: String,
        #[serde(default)]
        content: String,
    },
    CreateTodo {
        #[serde(default)]
        content: String,
    },
    CreateMapNote {
        // Some models emit the shorter field name.
        #[serde(alias = "location")]
        location_name: String,
        #[serde(default)]
        content: String,
    },
    UpdateNote {
        id: i64,
        #[serde(default)]
        title: String,
        #[serde(default)]
        content: String,
    },
    UpdateTodo {
        id: i64,
        #[serde(default)]
        content: String,
    },
}

fn default_note_title() -> String {
    "New Note".to_string()
}

impl Action {
    /// The content payload, for flows that echo it back to the user.
    pub fn content(&self) -> &str {
        match self {
            Action::CreateNote { content, .. }
            | Action::CreateTodo { content }
            | Action::CreateMapNote { content, .. }
            | Action::UpdateNote { content, .. }
            | Action::UpdateTodo { content, .. } => content,
        }
    }

    /// True for the `create_*` variants.
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Action::CreateNote { .. } | Action::CreateTodo { .. } | Action::CreateMapNote { .. }
        )
    }
}

/// One bubble in the conversation.
///
/// Assistant messages are created when the first streamed content arrives and
/// their `content` is rewritten on every subsequent chunk; `pending_actions`
/// is populated once at stream end and drained as the user confirms or cancels
/// each action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    /// Unix millis.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_actions: Vec<Action>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, true)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, false)
    }

    fn new(content: impl Into<String>, is_user: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            is_user,
            timestamp: Utc::now().timestamp_millis(),
            pending_actions: Vec::new(),
        }
    }
}

/// Linear loading model for an in-flight assistant reply.
///
/// `Idle → Thinking → Answering → Organizing → Idle`; the only back-transition
/// is the terminal reset to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    #[default]
    Idle,
    /// Request sent, no tokens received yet.
    Thinking,
    /// First content token received and displayed.
    Answering,
    /// An `<ACTION>` start was observed mid-stream; visible text is frozen.
    Organizing,
}

/// Identity of one conversation epoch.
///
/// Minted at construction and again on every clear; callbacks tagged with a
/// stale id are discarded instead of cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
