//! Persisted entities.
//!
//! `content` fields carry the richtext markup dialect; the codec in
//! `inkpad-richtext` is the only component that interprets it.

use serde::{Deserialize, Serialize};

/// A note. Map-pinned notes additionally carry coordinates, an address and a
/// marker hue; plain notes leave those unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Store-assigned key (0 until inserted).
    #[serde(default)]
    pub id: i64,
    pub title: String,
    /// Richtext markup string.
    pub content: String,
    /// Unix millis.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Map marker hue in degrees (0..360).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_color: Option<f32>,
}

impl Note {
    /// Creates a plain (non-pinned) note.
    pub fn new(title: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            timestamp,
            ai_summary: None,
            latitude: None,
            longitude: None,
            address: None,
            marker_color: None,
        }
    }
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(default)]
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub is_done: bool,
    /// Unix millis.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<i64>,
}

impl Todo {
    pub fn new(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: 0,
            content: content.into(),
            is_done: false,
            timestamp,
            deadline: None,
        }
    }
}
