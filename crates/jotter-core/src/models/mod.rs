//! Data models for Jotter

mod display;
mod draft;
mod note;

pub use display::DisplayNote;
pub use draft::{Attachment, DraftForm};
pub use note::{NewNote, Note, NoteId};
