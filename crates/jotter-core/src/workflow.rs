//! Note-with-attachment synchronization workflow.
//!
//! Keeps the client's view of notes consistent with the record store and the
//! blob store. An attachment is always durably uploaded before any record
//! references its key, and a listing never fails because one attachment URL
//! could not be resolved.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use crate::db::RecordStore;
use crate::models::{DisplayNote, DraftForm, Note, NoteId};
use crate::storage::{attachment_nonce, build_attachment_key, BlobStore};
use crate::{Error, Result};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Tunables for collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Budget for every individual store call.
    pub call_timeout: Duration,
    /// Requested lifetime of resolved attachment URLs.
    pub url_ttl: Duration,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            url_ttl: DEFAULT_URL_TTL,
        }
    }
}

/// Orchestrates note records and their attachments.
#[derive(Clone)]
pub struct NoteSyncWorkflow {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    options: WorkflowOptions,
}

impl NoteSyncWorkflow {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            records,
            blobs,
            options: WorkflowOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn options(&self) -> WorkflowOptions {
        self.options
    }

    /// Fetch every note and resolve attachment URLs concurrently.
    ///
    /// The result has one entry per stored record, in the store's order.
    /// Notes whose URL cannot be resolved are returned without one.
    pub async fn list_notes(&self) -> Result<Vec<DisplayNote>> {
        let notes = self
            .bounded("record list", self.records.list())
            .await
            .map_err(|error| match error {
                Error::Timeout { .. } => Error::RecordStore(error.to_string()),
                other => into_record_store_error(other),
            })?;
        tracing::debug!(count = notes.len(), "Fetched note records");

        Ok(join_all(notes.into_iter().map(|note| self.display(note))).await)
    }

    /// Create a note from a draft, uploading its attachment first.
    ///
    /// The draft itself is left untouched; clearing it is the caller's job
    /// once this returns `Ok`.
    pub async fn create_note(&self, draft: &DraftForm) -> Result<Note> {
        let mut new_note = draft.validate()?;

        if let Some(attachment) = &draft.attachment {
            let key = build_attachment_key(
                &attachment.file_name,
                chrono::Utc::now().timestamp_millis(),
                &attachment_nonce(),
            );
            self.bounded(
                "attachment upload",
                self.blobs
                    .upload(&key, &attachment.bytes, attachment.content_type.as_deref()),
            )
            .await
            .map_err(into_upload_error)?;
            tracing::debug!(key = %key, size = attachment.len(), "Uploaded attachment");
            new_note.image = Some(key);
        }

        let image = new_note.image.clone();
        let note = match self.bounded("record create", self.records.create(new_note)).await {
            Ok(note) => note,
            Err(error) => {
                if let Some(key) = image {
                    tracing::warn!(key = %key, "Attachment left unreferenced after failed create");
                }
                return Err(into_record_store_error(error));
            }
        };

        tracing::info!(note_id = %note.id, has_image = note.has_image(), "Created note");
        Ok(note)
    }

    /// Delete a note record, then best-effort delete its attachment.
    ///
    /// Fails with [`Error::NotFound`] when the note no longer exists. A failed
    /// attachment delete is logged and does not fail the call.
    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let note = self
            .bounded("record lookup", self.records.get(id))
            .await
            .map_err(into_record_store_error)?
            .ok_or(Error::NotFound(*id))?;

        self.bounded("record delete", self.records.delete(id))
            .await
            .map_err(into_record_store_error)?;
        tracing::info!(note_id = %id, "Deleted note");

        if let Some(key) = note.image {
            match self.bounded("attachment delete", self.blobs.delete(&key)).await {
                Ok(()) => tracing::debug!(key = %key, "Deleted attachment"),
                Err(error) => {
                    tracing::warn!(key = %key, %error, "Attachment delete failed; blob orphaned");
                }
            }
        }

        Ok(())
    }

    async fn display(&self, note: Note) -> DisplayNote {
        let Some(key) = note.image.as_deref() else {
            return DisplayNote::without_url(note);
        };

        let resolved = self.resolve_url(key).await;
        match resolved {
            Ok(url) => DisplayNote {
                note,
                image_url: Some(url),
            },
            Err(error) => {
                tracing::warn!(note_id = %note.id, %error, "Listing note without attachment URL");
                DisplayNote::without_url(note)
            }
        }
    }

    async fn resolve_url(&self, key: &str) -> Result<String> {
        let url = self
            .bounded(
                "attachment resolution",
                self.blobs.resolve_url(key, self.options.url_ttl),
            )
            .await
            .map_err(|error| resolution_error(key, &error))?;

        if url.trim().is_empty() {
            return Err(Error::Resolution {
                key: key.to_string(),
                reason: "blob store returned an empty URL".to_string(),
            });
        }
        Ok(url)
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let after = self.options.call_timeout;
        tokio::time::timeout(after, call)
            .await
            .map_err(|_| Error::Timeout { operation, after })?
    }
}

fn into_record_store_error(error: Error) -> Error {
    match error {
        Error::RecordStore(_) | Error::NotFound(_) | Error::Timeout { .. } => error,
        other => Error::RecordStore(other.to_string()),
    }
}

fn into_upload_error(error: Error) -> Error {
    match error {
        Error::Upload(_) => error,
        Error::BlobStore(message) => Error::Upload(message),
        other => Error::Upload(other.to_string()),
    }
}

fn resolution_error(key: &str, error: &Error) -> Error {
    let reason = match error {
        Error::BlobStore(message) => message.clone(),
        other => other.to_string(),
    };
    Error::Resolution {
        key: key.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{MemoryRecordStore, SqliteRecordStore};
    use crate::models::{Attachment, NewNote};
    use crate::storage::MemoryBlobStore;

    struct Harness {
        records: Arc<MemoryRecordStore>,
        blobs: Arc<MemoryBlobStore>,
        workflow: NoteSyncWorkflow,
    }

    fn harness() -> Harness {
        let records = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let workflow = NoteSyncWorkflow::new(records.clone(), blobs.clone());
        Harness {
            records,
            blobs,
            workflow,
        }
    }

    fn image_draft(name: &str) -> DraftForm {
        DraftForm::new(name, "with picture").with_attachment(
            Attachment::new(format!("{name}.png"), vec![1, 2, 3]).with_content_type("image/png"),
        )
    }

    #[tokio::test]
    async fn empty_fields_touch_no_store() {
        let h = harness();

        for draft in [
            DraftForm::new("", "Buy milk"),
            DraftForm::new("Milk", ""),
            DraftForm::new("  ", "\t"),
            DraftForm::new("", "").with_attachment(Attachment::new("a.png", vec![1])),
        ] {
            let err = h.workflow.create_note(&draft).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "got {err:?}");
        }

        assert_eq!(h.records.create_calls(), 0);
        assert_eq!(h.blobs.upload_calls(), 0);
    }

    #[tokio::test]
    async fn failed_upload_never_creates_record() {
        let h = harness();
        h.blobs.set_fail_uploads(true);

        let err = h.workflow.create_note(&image_draft("cat")).await.unwrap_err();

        assert!(matches!(err, Error::Upload(_)), "got {err:?}");
        assert_eq!(h.blobs.upload_calls(), 1);
        assert_eq!(h.records.create_calls(), 0);
        assert!(h.records.is_empty());
    }

    #[tokio::test]
    async fn upload_timeout_is_an_upload_failure() {
        struct StalledUploads;

        #[async_trait]
        impl BlobStore for StalledUploads {
            async fn upload(&self, _: &str, _: &[u8], _: Option<&str>) -> Result<()> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            }
            async fn resolve_url(&self, key: &str, _: Duration) -> Result<String> {
                Ok(format!("stalled://{key}"))
            }
            async fn delete(&self, _: &str) -> Result<()> {
                Ok(())
            }
        }

        let records = Arc::new(MemoryRecordStore::new());
        let workflow = NoteSyncWorkflow::new(records.clone(), Arc::new(StalledUploads))
            .with_options(WorkflowOptions {
                call_timeout: Duration::from_millis(20),
                ..WorkflowOptions::default()
            });

        let err = workflow.create_note(&image_draft("slow")).await.unwrap_err();
        assert!(matches!(err, Error::Upload(message) if message.contains("timed out")));
        assert_eq!(records.create_calls(), 0);
    }

    /// Record store that checks the referenced blob exists at create time.
    struct OrderingProbe {
        inner: MemoryRecordStore,
        blobs: Arc<MemoryBlobStore>,
        saw_missing_blob: AtomicBool,
    }

    #[async_trait]
    impl RecordStore for OrderingProbe {
        async fn list(&self) -> Result<Vec<Note>> {
            self.inner.list().await
        }
        async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
            self.inner.get(id).await
        }
        async fn create(&self, note: NewNote) -> Result<Note> {
            if let Some(key) = &note.image {
                if !self.blobs.contains(key) {
                    self.saw_missing_blob.store(true, Ordering::SeqCst);
                }
            }
            self.inner.create(note).await
        }
        async fn delete(&self, id: &NoteId) -> Result<()> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn upload_completes_before_record_create() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let probe = Arc::new(OrderingProbe {
            inner: MemoryRecordStore::new(),
            blobs: blobs.clone(),
            saw_missing_blob: AtomicBool::new(false),
        });
        let workflow = NoteSyncWorkflow::new(probe.clone(), blobs.clone());

        let note = workflow.create_note(&image_draft("dog")).await.unwrap();

        assert!(!probe.saw_missing_blob.load(Ordering::SeqCst));
        let key = note.image.expect("note should reference its attachment");
        assert!(key.ends_with("-dog.png"));
        assert_eq!(key.split('-').count(), 3);
        assert_eq!(blobs.bytes(&key), Some(vec![1, 2, 3]));
        assert_eq!(blobs.content_type(&key).as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn failed_record_create_is_a_record_store_error() {
        let h = harness();
        h.records.set_fail_create(true);

        let err = h.workflow.create_note(&image_draft("cat")).await.unwrap_err();
        assert!(matches!(err, Error::RecordStore(_)), "got {err:?}");
        // The blob is uploaded but no record points at it.
        assert_eq!(h.blobs.len(), 1);
        assert!(h.records.is_empty());
    }

    #[tokio::test]
    async fn roundtrip_without_image() {
        let h = harness();

        h.workflow
            .create_note(&DraftForm::new("A", "B"))
            .await
            .unwrap();
        let listed = h.workflow.list_notes().await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name(), "A");
        assert_eq!(listed[0].description(), "B");
        assert_eq!(listed[0].note.image, None);
        assert_eq!(listed[0].image_url, None);
    }

    #[tokio::test]
    async fn roundtrip_with_image_resolves_url() {
        let h = harness();

        let created = h.workflow.create_note(&image_draft("cat")).await.unwrap();
        let listed = h.workflow.list_notes().await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), created.id);
        let url = listed[0].image_url.as_deref().expect("url should resolve");
        assert!(!url.is_empty());
        assert!(url.contains(created.image.as_deref().unwrap()));
    }

    #[tokio::test]
    async fn unresolvable_image_degrades_single_note() {
        let h = harness();
        let first = h.workflow.create_note(&image_draft("one")).await.unwrap();
        let broken = h.workflow.create_note(&image_draft("two")).await.unwrap();
        let third = h.workflow.create_note(&image_draft("three")).await.unwrap();
        h.blobs.make_unresolvable(broken.image.clone().unwrap());

        let listed = h.workflow.list_notes().await.unwrap();

        assert_eq!(listed.len(), 3);
        let with_url: HashSet<NoteId> = listed
            .iter()
            .filter(|display| display.image_url.is_some())
            .map(DisplayNote::id)
            .collect();
        assert_eq!(with_url, HashSet::from([first.id, third.id]));
        let degraded = listed.iter().find(|d| d.id() == broken.id).unwrap();
        assert_eq!(degraded.image_url, None);
        assert_eq!(degraded.note.image, broken.image);
    }

    #[tokio::test]
    async fn listing_keeps_record_order_when_resolutions_finish_out_of_order() {
        let h = harness();
        let slow = h.workflow.create_note(&image_draft("slow")).await.unwrap();
        let plain = h
            .workflow
            .create_note(&DraftForm::new("plain", "no picture"))
            .await
            .unwrap();
        let fast = h.workflow.create_note(&image_draft("fast")).await.unwrap();
        h.blobs
            .delay_resolution(slow.image.clone().unwrap(), Duration::from_millis(60));

        let listed = h.workflow.list_notes().await.unwrap();

        let ids: Vec<NoteId> = listed.iter().map(DisplayNote::id).collect();
        assert_eq!(ids, vec![slow.id, plain.id, fast.id]);
        assert!(listed[0].image_url.is_some());
        assert!(listed[1].image_url.is_none());
        assert!(listed[2].image_url.is_some());
    }

    #[tokio::test]
    async fn resolution_timeout_degrades_only_that_note() {
        let records = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let workflow = NoteSyncWorkflow::new(records.clone(), blobs.clone()).with_options(
            WorkflowOptions {
                call_timeout: Duration::from_millis(30),
                ..WorkflowOptions::default()
            },
        );
        let stuck = workflow.create_note(&image_draft("stuck")).await.unwrap();
        let fine = workflow.create_note(&image_draft("fine")).await.unwrap();
        blobs.delay_resolution(stuck.image.clone().unwrap(), Duration::from_secs(2));

        let listed = workflow.list_notes().await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id(), stuck.id);
        assert_eq!(listed[0].image_url, None);
        assert_eq!(listed[1].id(), fine.id);
        assert!(listed[1].image_url.is_some());
    }

    #[tokio::test]
    async fn list_failure_is_a_record_store_error() {
        let h = harness();
        h.records.set_fail_list(true);

        let err = h.workflow.list_notes().await.unwrap_err();
        assert!(matches!(err, Error::RecordStore(_)));
    }

    #[tokio::test]
    async fn list_timeout_is_a_record_store_error() {
        struct StalledList;

        #[async_trait]
        impl RecordStore for StalledList {
            async fn list(&self) -> Result<Vec<Note>> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Vec::new())
            }
            async fn get(&self, _: &NoteId) -> Result<Option<Note>> {
                Ok(None)
            }
            async fn create(&self, note: NewNote) -> Result<Note> {
                Ok(Note::from_new(note))
            }
            async fn delete(&self, id: &NoteId) -> Result<()> {
                Err(Error::NotFound(*id))
            }
        }

        let blobs = Arc::new(MemoryBlobStore::new());
        let workflow = NoteSyncWorkflow::new(Arc::new(StalledList), blobs).with_options(
            WorkflowOptions {
                call_timeout: Duration::from_millis(20),
                ..WorkflowOptions::default()
            },
        );

        let err = workflow.list_notes().await.unwrap_err();
        assert!(matches!(err, Error::RecordStore(message) if message.contains("timed out")));
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let h = harness();
        let note = h
            .workflow
            .create_note(&DraftForm::new("Milk", "Buy milk"))
            .await
            .unwrap();

        h.workflow.delete_note(&note.id).await.unwrap();
        let err = h.workflow.delete_note(&note.id).await.unwrap_err();

        assert!(matches!(err, Error::NotFound(id) if id == note.id));
    }

    #[tokio::test]
    async fn delete_removes_attachment() {
        let h = harness();
        let note = h.workflow.create_note(&image_draft("cat")).await.unwrap();
        let key = note.image.clone().unwrap();
        assert!(h.blobs.contains(&key));

        h.workflow.delete_note(&note.id).await.unwrap();

        assert!(!h.blobs.contains(&key));
        assert!(h.records.is_empty());
    }

    #[tokio::test]
    async fn attachment_delete_failure_does_not_fail_delete() {
        let h = harness();
        let note = h.workflow.create_note(&image_draft("cat")).await.unwrap();
        h.blobs.set_fail_deletes(true);

        h.workflow.delete_note(&note.id).await.unwrap();

        assert!(h.records.is_empty());
        assert!(h.blobs.contains(&note.image.unwrap()));
    }

    #[tokio::test]
    async fn same_named_attachments_survive_each_others_delete() {
        let h = harness();
        let first = h.workflow.create_note(&image_draft("cat")).await.unwrap();
        let second = h.workflow.create_note(&image_draft("cat")).await.unwrap();
        assert_ne!(first.image, second.image);

        h.workflow.delete_note(&first.id).await.unwrap();

        let listed = h.workflow.list_notes().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), second.id);
        assert!(listed[0].image_url.is_some());
        assert_eq!(h.blobs.bytes(&second.image.unwrap()), Some(vec![1, 2, 3]));
    }

    /// Record store whose create and delete never answer in time.
    struct StalledWrites {
        inner: MemoryRecordStore,
    }

    #[async_trait]
    impl RecordStore for StalledWrites {
        async fn list(&self) -> Result<Vec<Note>> {
            self.inner.list().await
        }
        async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
            self.inner.get(id).await
        }
        async fn create(&self, _: NewNote) -> Result<Note> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(Error::RecordStore("too late".to_string()))
        }
        async fn delete(&self, _: &NoteId) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    fn stalled_writes(inner: MemoryRecordStore) -> (NoteSyncWorkflow, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let workflow = NoteSyncWorkflow::new(Arc::new(StalledWrites { inner }), blobs.clone())
            .with_options(WorkflowOptions {
                call_timeout: Duration::from_millis(20),
                ..WorkflowOptions::default()
            });
        (workflow, blobs)
    }

    #[tokio::test]
    async fn record_create_timeout_is_reported_as_timeout() {
        let (workflow, blobs) = stalled_writes(MemoryRecordStore::new());

        let err = workflow.create_note(&image_draft("cat")).await.unwrap_err();

        assert!(
            matches!(err, Error::Timeout { operation: "record create", .. }),
            "got {err:?}"
        );
        // Upload happened first and stays unreferenced.
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn record_delete_timeout_is_reported_and_keeps_attachment() {
        let inner = MemoryRecordStore::new();
        let note = inner
            .create(NewNote::new("Milk", "Buy milk").with_image("1-n-milk.png"))
            .await
            .unwrap();
        let (workflow, blobs) = stalled_writes(inner);
        blobs.insert("1-n-milk.png", vec![1]);

        let err = workflow.delete_note(&note.id).await.unwrap_err();

        assert!(
            matches!(err, Error::Timeout { operation: "record delete", .. }),
            "got {err:?}"
        );
        assert!(blobs.contains("1-n-milk.png"));
    }

    #[tokio::test]
    async fn milk_scenario_against_sqlite() {
        let records = Arc::new(SqliteRecordStore::open_in_memory().unwrap());
        let workflow = NoteSyncWorkflow::new(records, Arc::new(MemoryBlobStore::new()));

        workflow
            .create_note(&DraftForm::new("Milk", "Buy milk"))
            .await
            .unwrap();
        let listed = workflow.list_notes().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name(), "Milk");
        assert_eq!(listed[0].description(), "Buy milk");
        assert_eq!(listed[0].image_url, None);

        workflow.delete_note(&listed[0].id()).await.unwrap();
        assert!(workflow.list_notes().await.unwrap().is_empty());
    }
}
