//! Error types for assistant requests.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of assistant errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection timeout or request timeout
    Timeout,
    /// Failed to connect or other transport-level failure
    Network,
    /// Failed to parse a response (JSON parse error, invalid SSE, etc.)
    Parse,
}

impl fmt::Display for AssistantErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantErrorKind::HttpStatus => write!(f, "http_status"),
            AssistantErrorKind::Timeout => write!(f, "timeout"),
            AssistantErrorKind::Network => write!(f, "network"),
            AssistantErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from an assistant request with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantError {
    /// Error category
    pub kind: AssistantErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl AssistantError {
    pub fn new(kind: AssistantErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, extracting a cleaner message from a JSON
    /// error body when the provider sends one.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}");
        let details = if body.is_empty() {
            None
        } else {
            if let Ok(json) = serde_json::from_str::<Value>(body)
                && let Some(error_obj) = json.get("error")
                && let Some(msg) = error_obj.get("message").and_then(|v| v.as_str())
            {
                return Self {
                    kind: AssistantErrorKind::HttpStatus,
                    message: format!("HTTP {status}: {msg}"),
                    details: Some(body.to_string()),
                };
            }
            Some(body.to_string())
        };
        Self {
            kind: AssistantErrorKind::HttpStatus,
            message,
            details,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Network, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(AssistantErrorKind::Parse, message)
    }
}

impl fmt::Display for AssistantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AssistantError {}

/// Result type for assistant operations.
pub type AssistantResult<T> = std::result::Result<T, AssistantError>;
