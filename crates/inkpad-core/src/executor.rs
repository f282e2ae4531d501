//! Executes user-confirmed actions against the store.

use anyhow::Result;
use chrono::Utc;
use inkpad_types::{Action, Note, Todo};
use tracing::info;

use crate::client::ChatClient;
use crate::store::{NoteStore, PlaceSearch};

/// Marker hue for assistant-created map pins (azure).
const MAP_MARKER_HUE: f32 = 210.0;

/// Fallback title length when title generation fails.
const FALLBACK_TITLE_CHARS: usize = 20;

/// What happened, phrased for the chat transcript. `applied` is false when
/// the action degraded (location not resolved, target id missing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub message: String,
    pub applied: bool,
}

impl ActionOutcome {
    fn applied(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            applied: true,
        }
    }

    fn degraded(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            applied: false,
        }
    }
}

/// Applies one confirmed action.
///
/// Update targets that no longer exist produce a degraded outcome instead of
/// an error; the conversation moves on either way.
///
/// # Errors
/// Returns an error only when the store or place lookup itself fails.
pub async fn execute_action<S, P>(action: Action, store: &S, places: &P) -> Result<ActionOutcome>
where
    S: NoteStore,
    P: PlaceSearch,
{
    let now = Utc::now().timestamp_millis();

    match action {
        Action::CreateNote { title, content } => {
            store.insert_note(Note::new(&title, content, now)).await?;
            info!(%title, "created note");
            Ok(ActionOutcome::applied(format!("Saved note \"{title}\".")))
        }
        Action::CreateTodo { content } => {
            store.insert_todo(Todo::new(&content, now)).await?;
            Ok(ActionOutcome::applied(format!("Added todo: {content}")))
        }
        Action::CreateMapNote {
            location_name,
            content,
        } => create_map_note(&location_name, content, store, places, now).await,
        Action::UpdateNote { id, title, content } => {
            let Some(mut note) = store.get_note(id).await? else {
                return Ok(ActionOutcome::degraded(format!("Note {id} not found.")));
            };
            if !title.trim().is_empty() {
                note.title = title;
            }
            if !content.trim().is_empty() {
                note.content = content;
            }
            note.timestamp = now;
            let name = note.title.clone();
            store.update_note(note).await?;
            Ok(ActionOutcome::applied(format!("Updated note \"{name}\".")))
        }
        Action::UpdateTodo { id, content } => {
            let Some(mut todo) = store.get_todo(id).await? else {
                return Ok(ActionOutcome::degraded(format!("Todo {id} not found.")));
            };
            if !content.trim().is_empty() {
                todo.content = content;
            }
            let text = todo.content.clone();
            store.update_todo(todo).await?;
            Ok(ActionOutcome::applied(format!("Updated todo: {text}")))
        }
    }
}

/// Resolves the location and pins a note to it. Without a usable match the
/// note is still saved, just unpinned.
async fn create_map_note<S, P>(
    location_name: &str,
    content: String,
    store: &S,
    places: &P,
    now: i64,
) -> Result<ActionOutcome>
where
    S: NoteStore,
    P: PlaceSearch,
{
    let matches = places.search(location_name).await?;
    let pinned = matches.into_iter().find_map(|m| match m.point {
        Some(point) => Some((m.name, m.address, point)),
        None => None,
    });

    let Some((name, address, point)) = pinned else {
        store
            .insert_note(Note::new(location_name, content, now))
            .await?;
        return Ok(ActionOutcome::degraded(format!(
            "Couldn't find \"{location_name}\" on the map. Saved as a regular note."
        )));
    };

    let mut note = Note::new(location_name, content, now);
    note.latitude = Some(point.latitude);
    note.longitude = Some(point.longitude);
    note.address = Some(if address.is_empty() { name } else { address });
    note.marker_color = Some(MAP_MARKER_HUE);
    store.insert_note(note).await?;

    info!(location = location_name, "created map note");
    Ok(ActionOutcome::applied(format!(
        "Pinned \"{location_name}\" on the map."
    )))
}

/// Saves a chat message verbatim as a note ("save this" on a bubble).
///
/// The title comes from a model call; if that fails the content itself is
/// truncated into one, so the save never depends on the network.
///
/// # Errors
/// Returns an error only when the store insert fails.
pub async fn save_message_as_note<S: NoteStore>(
    client: &ChatClient,
    store: &S,
    content: &str,
) -> Result<ActionOutcome> {
    let title = match client.generate_title(content).await {
        Ok(title) if !title.is_empty() => title,
        Ok(_) => fallback_title(content),
        Err(err) => {
            info!(%err, "title generation failed, falling back to truncation");
            fallback_title(content)
        }
    };

    let now = Utc::now().timestamp_millis();
    store.insert_note(Note::new(&title, content, now)).await?;
    Ok(ActionOutcome::applied(format!("Saved note \"{title}\".")))
}

/// Saves a chat message verbatim as a todo.
///
/// # Errors
/// Returns an error only when the store insert fails.
pub async fn save_message_as_todo<S: NoteStore>(store: &S, content: &str) -> Result<ActionOutcome> {
    let now = Utc::now().timestamp_millis();
    store.insert_todo(Todo::new(content, now)).await?;
    Ok(ActionOutcome::applied("Added to your todos."))
}

fn fallback_title(content: &str) -> String {
    if content.chars().count() > FALLBACK_TITLE_CHARS {
        let cut: String = content.chars().take(FALLBACK_TITLE_CHARS).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}
