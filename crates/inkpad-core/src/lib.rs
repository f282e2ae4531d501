//! Core engine for the note assistant: streaming chat transport, the action
//! protocol, conversation state, and action execution.
//!
//! The crate is UI-agnostic. A frontend drives it by calling
//! [`session::ChatSession::begin_request`], sending the request through
//! [`assistant::Assistant`], and applying the resulting events; confirmed
//! actions run through [`executor::execute_action`] against whatever
//! [`store::NoteStore`] the platform provides.

pub mod assistant;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod prompts;
pub mod protocol;
pub mod session;
pub mod store;

pub use assistant::{Assistant, chat_messages};
pub use client::{ChatClient, ChatClientConfig, RequestMessage, TokenStream};
pub use config::AssistantConfig;
pub use error::{AssistantError, AssistantErrorKind, AssistantResult};
pub use executor::{ActionOutcome, execute_action, save_message_as_note, save_message_as_todo};
pub use protocol::{ParsedResponse, StreamView, filter_stream, parse_response};
pub use session::{AssistantEvent, ChatSession};
pub use store::{GeoPoint, NoteStore, PlaceMatch, PlaceSearch};
