//! View-only note enriched with a resolved attachment URL

use serde::{Deserialize, Serialize};

use super::note::{Note, NoteId};

/// A note as shown to the user.
///
/// Recomputed on every listing and never persisted. `image_url` is set only
/// when the note has an image and its URL resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayNote {
    #[serde(flatten)]
    pub note: Note,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl DisplayNote {
    pub const fn without_url(note: Note) -> Self {
        Self {
            note,
            image_url: None,
        }
    }

    pub const fn id(&self) -> NoteId {
        self.note.id
    }

    pub fn name(&self) -> &str {
        &self.note.name
    }

    pub fn description(&self) -> &str {
        &self.note.description
    }
}
