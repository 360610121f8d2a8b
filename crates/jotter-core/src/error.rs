//! Error types for jotter-core

use std::time::Duration;

use thiserror::Error;

use crate::models::NoteId;

/// Result type alias using jotter-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jotter-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required draft field is missing
    #[error("Invalid note: {0}")]
    Validation(String),

    /// Attachment upload failed; no record was created
    #[error("Attachment upload failed: {0}")]
    Upload(String),

    /// Record store create/list/delete failure
    #[error("Record store error: {0}")]
    RecordStore(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(NoteId),

    /// Attachment URL could not be resolved
    #[error("Could not resolve attachment URL for {key}: {reason}")]
    Resolution { key: String, reason: String },

    /// Media/object storage error outside of upload and resolution
    #[error("Storage error: {0}")]
    BlobStore(String),

    /// A collaborator call exceeded its time budget
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Identity provider failure
    #[error("Identity error: {0}")]
    Identity(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error should reach the user.
    ///
    /// Resolution failures only degrade a single listed note.
    pub const fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Resolution { .. })
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<crate::auth::AuthError> for Error {
    fn from(error: crate::auth::AuthError) -> Self {
        Self::Identity(error.to_string())
    }
}
