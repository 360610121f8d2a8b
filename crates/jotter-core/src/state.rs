//! Client state for the notes screen.
//!
//! State only changes through [`NotesState::apply`]; front-ends render from
//! it and never mutate fields directly.

use crate::models::{Attachment, DisplayNote, DraftForm, NoteId};

/// Whether the note list reflects the stores yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    NotLoaded,
    Loaded,
    Failed,
}

/// Everything a front-end needs to render the notes screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotesState {
    /// Notes from the most recent successful listing
    pub notes: Vec<DisplayNote>,
    /// Form being edited
    pub draft: DraftForm,
    /// Last user-visible error message
    pub last_error: Option<String>,
    pub status: LoadStatus,
}

/// Events that move [`NotesState`] forward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotesAction {
    DraftNameChanged(String),
    DraftDescriptionChanged(String),
    DraftAttachmentChanged(Option<Attachment>),
    NotesLoaded(Vec<DisplayNote>),
    NoteCreated,
    NoteDeleted(NoteId),
    OperationFailed(String),
    SignedOut,
}

impl NotesState {
    pub fn apply(&mut self, action: NotesAction) {
        match action {
            NotesAction::DraftNameChanged(name) => {
                self.draft.name = name;
                self.last_error = None;
            }
            NotesAction::DraftDescriptionChanged(description) => {
                self.draft.description = description;
                self.last_error = None;
            }
            NotesAction::DraftAttachmentChanged(attachment) => {
                self.draft.attachment = attachment;
                self.last_error = None;
            }
            NotesAction::NotesLoaded(notes) => {
                self.notes = notes;
                self.status = LoadStatus::Loaded;
            }
            NotesAction::NoteCreated => {
                self.draft.clear();
                self.last_error = None;
            }
            NotesAction::NoteDeleted(id) => {
                self.notes.retain(|display| display.id() != id);
                self.last_error = None;
            }
            NotesAction::OperationFailed(message) => {
                if self.status == LoadStatus::NotLoaded {
                    self.status = LoadStatus::Failed;
                }
                self.last_error = Some(message);
            }
            NotesAction::SignedOut => *self = Self::default(),
        }
    }

    pub fn note(&self, id: NoteId) -> Option<&DisplayNote> {
        self.notes.iter().find(|display| display.id() == id)
    }
}
