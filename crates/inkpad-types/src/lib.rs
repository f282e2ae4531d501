//! Shared plain-data types for the inkpad workspace (entities, chat, actions).

mod chat;
mod entities;

pub use chat::{Action, ChatMessage, LoadingState, SessionId};
pub use entities::{Note, Todo};
