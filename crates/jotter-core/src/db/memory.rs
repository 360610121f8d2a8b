//! In-memory record store

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{NewNote, Note, NoteId};

use super::RecordStore;

/// Insertion-ordered record store held in process memory.
///
/// Counts calls and can be told to fail, which makes it the usual double for
/// workflow tests.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    notes: Mutex<Vec<Note>>,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    create_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Note>> {
        self.notes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self) -> Result<Vec<Note>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::RecordStore("list unavailable".to_string()));
        }
        Ok(self.lock().clone())
    }

    async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.lock().iter().find(|note| note.id == *id).cloned())
    }

    async fn create(&self, note: NewNote) -> Result<Note> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::RecordStore("create rejected".to_string()));
        }
        let note = Note::from_new(note);
        self.lock().push(note.clone());
        Ok(note)
    }

    async fn delete(&self, id: &NoteId) -> Result<()> {
        let mut notes = self.lock();
        let Some(index) = notes.iter().position(|note| note.id == *id) else {
            return Err(Error::NotFound(*id));
        };
        notes.remove(index);
        Ok(())
    }
}
