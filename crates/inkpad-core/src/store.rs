//! Storage and geocoding seams.
//!
//! The app ships platform-specific implementations (a mobile database, a
//! places SDK); the core only depends on these traits. Tests use the in-memory
//! implementations from the executor tests.

use anyhow::Result;
use inkpad_types::{Note, Todo};

/// Persistent store for notes and todos.
pub trait NoteStore {
    /// Inserts a note and returns its assigned id.
    fn insert_note(&self, note: Note) -> impl Future<Output = Result<i64>> + Send;
    fn update_note(&self, note: Note) -> impl Future<Output = Result<()>> + Send;
    fn delete_note(&self, id: i64) -> impl Future<Output = Result<()>> + Send;
    fn get_note(&self, id: i64) -> impl Future<Output = Result<Option<Note>>> + Send;
    fn list_notes(&self) -> impl Future<Output = Result<Vec<Note>>> + Send;
    /// Substring search over note titles and content.
    fn search_notes(&self, query: &str) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Inserts a todo and returns its assigned id.
    fn insert_todo(&self, todo: Todo) -> impl Future<Output = Result<i64>> + Send;
    fn update_todo(&self, todo: Todo) -> impl Future<Output = Result<()>> + Send;
    fn delete_todo(&self, id: i64) -> impl Future<Output = Result<()>> + Send;
    fn get_todo(&self, id: i64) -> impl Future<Output = Result<Option<Todo>>> + Send;
    fn list_todos(&self) -> impl Future<Output = Result<Vec<Todo>>> + Send;
}

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One result of a place lookup. Providers may return matches without a
/// resolved coordinate; those cannot be pinned.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceMatch {
    pub name: String,
    pub address: String,
    pub point: Option<GeoPoint>,
}

/// Forward-geocoding service used to resolve map note locations.
pub trait PlaceSearch {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<PlaceMatch>>> + Send;
}
