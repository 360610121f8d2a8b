//! jotter-core - Core library for Jotter
//!
//! Models, collaborator contracts and their adapters, the note-with-attachment
//! workflow and the client state used by the `jotter` front-end.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod util;
pub mod workflow;

pub use app::{DeleteOutcome, NotesApp};
pub use auth::{IdentityProvider, User};
pub use config::JotterConfig;
pub use db::RecordStore;
pub use error::{Error, Result};
pub use models::{Attachment, DisplayNote, DraftForm, Note, NoteId};
pub use state::{NotesAction, NotesState};
pub use storage::BlobStore;
pub use workflow::{NoteSyncWorkflow, WorkflowOptions};
