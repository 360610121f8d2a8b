//! Record store contract and its `SQLite` implementation

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{NewNote, Note, NoteId};

/// Structured storage for note records.
///
/// Implementations assign ids on create and own the canonical note lifetime.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List every stored note. Order is implementation-defined.
    async fn list(&self) -> Result<Vec<Note>>;

    /// Get a note by ID
    async fn get(&self, id: &NoteId) -> Result<Option<Note>>;

    /// Persist a new note and return it with its assigned id
    async fn create(&self, note: NewNote) -> Result<Note>;

    /// Remove a note, failing with [`Error::NotFound`] when it does not exist
    async fn delete(&self, id: &NoteId) -> Result<()>;
}

/// `SQLite` implementation of `RecordStore`
///
/// Lists newest first.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Parse a note from a database row
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        let id: String = row.get(0)?;
        let id = id.parse().map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(error))
        })?;
        Ok(Note {
            id,
            name: row.get(1)?,
            description: row.get(2)?,
            image: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn list(&self) -> Result<Vec<Note>> {
        let db = self.db.lock().await;
        let mut stmt = db.connection().prepare(
            "SELECT id, name, description, image, created_at
             FROM notes
             ORDER BY created_at DESC, id DESC",
        )?;

        let notes = stmt
            .query_map([], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        let db = self.db.lock().await;
        let note = db
            .connection()
            .query_row(
                "SELECT id, name, description, image, created_at FROM notes WHERE id = ?",
                params![id.as_str()],
                Self::parse_note,
            )
            .optional()?;

        Ok(note)
    }

    async fn create(&self, note: NewNote) -> Result<Note> {
        let note = Note::from_new(note);

        let db = self.db.lock().await;
        db.connection().execute(
            "INSERT INTO notes (id, name, description, image, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                note.id.as_str(),
                note.name,
                note.description,
                note.image,
                note.created_at
            ],
        )?;

        Ok(note)
    }

    async fn delete(&self, id: &NoteId) -> Result<()> {
        let db = self.db.lock().await;
        let rows = db
            .connection()
            .execute("DELETE FROM notes WHERE id = ?", params![id.as_str()])?;

        if rows == 0 {
            return Err(Error::NotFound(*id));
        }

        Ok(())
    }
}
