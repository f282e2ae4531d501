//! Fire-and-forget request driver.
//!
//! [`Assistant::send`] spawns the network request and forwards everything as
//! [`AssistantEvent`]s over a channel; the UI task owns the [`ChatSession`]
//! and feeds the events into it. Nothing here blocks on the request.
//!
//! [`ChatSession`]: crate::session::ChatSession

use std::sync::Arc;

use futures_util::StreamExt;
use inkpad_types::{ChatMessage, Note, SessionId, Todo};
use tokio::sync::mpsc;

use crate::client::{ChatClient, RequestMessage};
use crate::context::build_user_prompt;
use crate::prompts::SYSTEM_PROMPT;
use crate::session::AssistantEvent;

/// Spawner for assistant requests.
pub struct Assistant {
    client: Arc<ChatClient>,
    events: mpsc::UnboundedSender<AssistantEvent>,
}

impl Assistant {
    /// Returns the assistant and the receiving end of its event channel.
    pub fn new(client: ChatClient) -> (Self, mpsc::UnboundedReceiver<AssistantEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                client: Arc::new(client),
                events,
            },
            rx,
        )
    }

    /// Spawns a streaming chat request. Results come back on the event
    /// channel tagged with `session`; a dropped receiver ends the task.
    pub fn send(&self, session: SessionId, messages: Vec<RequestMessage>) {
        let client = Arc::clone(&self.client);
        let events = self.events.clone();

        tokio::spawn(async move {
            let mut stream = match client.stream_chat(&messages).await {
                Ok(stream) => stream,
                Err(error) => {
                    let _ = events.send(AssistantEvent::Failed { session, error });
                    return;
                }
            };

            while let Some(item) = stream.next().await {
                match item {
                    Ok(text) => {
                        if events
                            .send(AssistantEvent::Chunk { session, text })
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(error) => {
                        let _ = events.send(AssistantEvent::Failed { session, error });
                        return;
                    }
                }
            }

            let _ = events.send(AssistantEvent::Completed { session });
        });
    }
}

/// Assembles the wire messages for one chat turn: the fixed system prompt
/// plus a user prompt carrying the data snapshot, recent conversation, and
/// the question.
///
/// `messages` is the session transcript after `begin_request`; its final
/// entry is the question itself and is excluded from the replayed history.
pub fn chat_messages(
    notes: &[Note],
    todos: &[Todo],
    messages: &[ChatMessage],
    question: &str,
    use_summaries: bool,
) -> Vec<RequestMessage> {
    let history = &messages[..messages.len().saturating_sub(1)];
    vec![
        RequestMessage::system(SYSTEM_PROMPT),
        RequestMessage::user(build_user_prompt(
            notes,
            todos,
            history,
            question,
            use_summaries,
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_messages_shape() {
        let messages = chat_messages(&[], &[], &[], "hi", false);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("<ACTION>"));
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.ends_with("hi"));
    }

    #[test]
    fn test_chat_messages_excludes_current_question_from_history() {
        let transcript = vec![
            ChatMessage::user("earlier"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("now"),
        ];
        let messages = chat_messages(&[], &[], &transcript, "now", false);
        assert!(messages[1].content.contains("User: earlier"));
        assert!(messages[1].content.contains("Assistant: reply"));
        assert!(!messages[1].content.contains("User: now"));
    }
}
