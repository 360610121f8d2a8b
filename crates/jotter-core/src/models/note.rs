//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a note, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// A persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Identifier assigned by the record store
    pub id: NoteId,
    pub name: String,
    pub description: String,
    /// Blob store key of the attached image, if any
    pub image: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Note {
    /// Materialize a stored note from a create payload.
    ///
    /// Record stores call this to assign the id and timestamp.
    #[must_use]
    pub fn from_new(new_note: NewNote) -> Self {
        Self {
            id: NoteId::new(),
            name: new_note.name,
            description: new_note.description,
            image: new_note.image,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub const fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Create payload for a note: everything but the store-assigned fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

impl NewNote {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, key: impl Into<String>) -> Self {
        self.image = Some(key.into());
        self
    }
}
