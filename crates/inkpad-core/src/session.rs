//! Conversation state machine.
//!
//! [`ChatSession`] owns the message list and loading state, and advances by
//! consuming [`AssistantEvent`]s from whatever task runs the network request.
//! It performs no I/O itself, so the whole lifecycle is testable with plain
//! synchronous calls.

use inkpad_types::{Action, ChatMessage, LoadingState, SessionId};
use tracing::debug;

use crate::error::AssistantError;
use crate::protocol::{filter_stream, parse_response};

/// Events produced while streaming one assistant reply. Every event carries
/// the id of the request epoch that produced it.
#[derive(Debug, Clone)]
pub enum AssistantEvent {
    /// A content delta arrived.
    Chunk { session: SessionId, text: String },
    /// The stream finished normally.
    Completed { session: SessionId },
    /// The request failed or the stream broke.
    Failed {
        session: SessionId,
        error: AssistantError,
    },
}

impl AssistantEvent {
    fn session(&self) -> SessionId {
        match self {
            AssistantEvent::Chunk { session, .. }
            | AssistantEvent::Completed { session }
            | AssistantEvent::Failed { session, .. } => *session,
        }
    }
}

/// One conversation with the assistant.
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    loading: LoadingState,
    session_id: SessionId,
    /// Raw accumulated stream for the in-flight reply.
    buffer: String,
    /// Id of the assistant message being streamed into, once one exists.
    active_message_id: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn loading(&self) -> LoadingState {
        self.loading
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Records the user's message and opens a new request epoch.
    ///
    /// Events from any earlier epoch are discarded from here on; the returned
    /// id must be attached to every event of the new request.
    pub fn begin_request(&mut self, text: impl Into<String>) -> SessionId {
        self.messages.push(ChatMessage::user(text));
        self.loading = LoadingState::Thinking;
        self.buffer.clear();
        self.active_message_id = None;
        self.session_id = SessionId::new();
        self.session_id
    }

    /// Advances the conversation by one event. Stale-session events are
    /// dropped without touching any state.
    pub fn apply(&mut self, event: AssistantEvent) {
        if event.session() != self.session_id {
            debug!(session = %event.session(), "discarding event from stale session");
            return;
        }

        match event {
            AssistantEvent::Chunk { text, .. } => self.on_chunk(&text),
            AssistantEvent::Completed { .. } => self.on_completed(),
            AssistantEvent::Failed { error, .. } => self.on_failed(&error),
        }
    }

    fn on_chunk(&mut self, text: &str) {
        self.buffer.push_str(text);
        let view = filter_stream(&self.buffer);

        if view.organizing {
            self.loading = LoadingState::Organizing;
        } else if !view.visible.is_empty() {
            self.loading = LoadingState::Answering;
        }

        if !view.visible.is_empty() {
            self.upsert_reply(view.visible);
        }
    }

    fn on_completed(&mut self) {
        let previous = self.previous_reply_text();
        let parsed = parse_response(&self.buffer, previous.as_deref());

        // An update-only response has no visible text at all; the actions
        // still need a message to hang off so the user can confirm them.
        let mut display = parsed.display_text;
        if display.is_empty() && !parsed.actions.is_empty() {
            display = "I've prepared an item for you to review.".to_string();
        }

        if !display.is_empty() || self.active_message_id.is_some() {
            let id = self.upsert_reply(display);
            if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
                message.pending_actions = parsed.actions;
            }
        }

        for error in parsed.errors {
            self.messages.push(ChatMessage::assistant(error));
        }

        self.finish_request();
    }

    fn on_failed(&mut self, error: &AssistantError) {
        self.messages
            .push(ChatMessage::assistant(format!("Request failed: {error}")));
        self.finish_request();
    }

    fn finish_request(&mut self) {
        self.loading = LoadingState::Idle;
        self.buffer.clear();
        self.active_message_id = None;
    }

    /// Creates the streaming reply message on first content, rewrites it on
    /// later calls. Returns the message id.
    fn upsert_reply(&mut self, content: String) -> String {
        if let Some(id) = &self.active_message_id {
            let id = id.clone();
            if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
                message.content = content;
            }
            id
        } else {
            let message = ChatMessage::assistant(content);
            let id = message.id.clone();
            self.active_message_id = Some(id.clone());
            self.messages.push(message);
            id
        }
    }

    /// Most recent assistant reply that predates the in-flight one.
    fn previous_reply_text(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .filter(|m| !m.is_user)
            .find(|m| Some(&m.id) != self.active_message_id.as_ref())
            .map(|m| m.content.clone())
    }

    /// Resets the conversation and rolls the session id so in-flight events
    /// can no longer land.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.finish_request();
        self.session_id = SessionId::new();
    }

    /// Removes and returns one pending action after user confirmation.
    pub fn confirm_action(&mut self, message_id: &str, index: usize) -> Option<Action> {
        let message = self.messages.iter_mut().find(|m| m.id == message_id)?;
        if index < message.pending_actions.len() {
            Some(message.pending_actions.remove(index))
        } else {
            None
        }
    }

    /// Drops one pending action. Returns false when it does not exist.
    pub fn cancel_action(&mut self, message_id: &str, index: usize) -> bool {
        self.confirm_action(message_id, index).is_some()
    }
}
