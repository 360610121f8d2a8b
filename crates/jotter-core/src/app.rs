//! Notes screen controller.
//!
//! Wires the identity provider and the workflow to [`NotesState`]. Every
//! mutation is followed by an explicit refresh of the listing.

use std::future::Future;
use std::sync::Arc;

use crate::auth::{IdentityProvider, User};
use crate::models::{Attachment, Note, NoteId};
use crate::state::{NotesAction, NotesState};
use crate::workflow::NoteSyncWorkflow;
use crate::{Error, Result};

/// Result of [`NotesApp::delete_note`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The note was already gone, e.g. after a repeated request.
    AlreadyDeleted,
}

pub struct NotesApp {
    identity: Arc<dyn IdentityProvider>,
    workflow: NoteSyncWorkflow,
    state: NotesState,
}

impl NotesApp {
    pub fn new(identity: Arc<dyn IdentityProvider>, workflow: NoteSyncWorkflow) -> Self {
        Self {
            identity,
            workflow,
            state: NotesState::default(),
        }
    }

    pub const fn state(&self) -> &NotesState {
        &self.state
    }

    pub async fn current_user(&self) -> Result<Option<User>> {
        self.bounded("identity lookup", self.identity.current_user()).await
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        self.bounded("sign out", self.identity.sign_out()).await?;
        self.dispatch(NotesAction::SignedOut);
        Ok(())
    }

    /// Re-list notes from the stores.
    pub async fn refresh(&mut self) -> Result<()> {
        let listed = self.workflow.list_notes().await;
        match listed {
            Ok(notes) => {
                self.dispatch(NotesAction::NotesLoaded(notes));
                Ok(())
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    pub fn update_draft_name(&mut self, name: impl Into<String>) {
        self.dispatch(NotesAction::DraftNameChanged(name.into()));
    }

    pub fn update_draft_description(&mut self, description: impl Into<String>) {
        self.dispatch(NotesAction::DraftDescriptionChanged(description.into()));
    }

    pub fn update_draft_attachment(&mut self, attachment: Option<Attachment>) {
        self.dispatch(NotesAction::DraftAttachmentChanged(attachment));
    }

    /// Create a note from the current draft.
    ///
    /// On failure the draft is kept so the user can retry.
    pub async fn submit_draft(&mut self) -> Result<Note> {
        let created = self.workflow.create_note(&self.state.draft).await;
        let note = match created {
            Ok(note) => note,
            Err(error) => return Err(self.fail(error)),
        };

        self.dispatch(NotesAction::NoteCreated);
        self.refresh_after_mutation().await;
        Ok(note)
    }

    /// Delete a note. Deleting a note that no longer exists succeeds.
    pub async fn delete_note(&mut self, id: NoteId) -> Result<DeleteOutcome> {
        let deleted = self.workflow.delete_note(&id).await;
        let outcome = match deleted {
            Ok(()) => DeleteOutcome::Deleted,
            Err(Error::NotFound(_)) => {
                tracing::info!(note_id = %id, "Note already deleted");
                DeleteOutcome::AlreadyDeleted
            }
            Err(error) => return Err(self.fail(error)),
        };

        self.dispatch(NotesAction::NoteDeleted(id));
        self.refresh_after_mutation().await;
        Ok(outcome)
    }

    // Identity calls share the workflow's per-call budget.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let after = self.workflow.options().call_timeout;
        tokio::time::timeout(after, call)
            .await
            .map_err(|_| Error::Timeout { operation, after })?
    }

    fn dispatch(&mut self, action: NotesAction) {
        self.state.apply(action);
    }

    fn fail(&mut self, error: Error) -> Error {
        if error.is_user_visible() {
            self.dispatch(NotesAction::OperationFailed(error.to_string()));
        }
        error
    }

    // The mutation already succeeded; a failed refresh only shows up in state.
    async fn refresh_after_mutation(&mut self) {
        if let Err(error) = self.refresh().await {
            tracing::warn!(%error, "Failed to refresh notes after mutation");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::auth::LocalIdentity;
    use crate::db::MemoryRecordStore;
    use crate::state::LoadStatus;
    use crate::storage::MemoryBlobStore;
    use crate::workflow::WorkflowOptions;

    fn app() -> (NotesApp, Arc<MemoryRecordStore>, Arc<MemoryBlobStore>) {
        let records = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let workflow = NoteSyncWorkflow::new(records.clone(), blobs.clone());
        let app = NotesApp::new(Arc::new(LocalIdentity::new("ada")), workflow);
        (app, records, blobs)
    }

    #[tokio::test]
    async fn greets_current_user() {
        let (app, _, _) = app();
        let user = app.current_user().await.unwrap().unwrap();
        assert_eq!(format!("Hello, {}", user.username), "Hello, ada");
    }

    #[tokio::test]
    async fn submit_clears_draft_and_refreshes() {
        let (mut app, _, _) = app();
        app.update_draft_name("Milk");
        app.update_draft_description("Buy milk");

        let note = app.submit_draft().await.unwrap();

        assert!(app.state().draft.is_blank());
        assert_eq!(app.state().status, LoadStatus::Loaded);
        assert_eq!(app.state().notes.len(), 1);
        assert_eq!(app.state().notes[0].id(), note.id);
    }

    #[tokio::test]
    async fn failed_upload_keeps_draft_and_reports_error() {
        let (mut app, records, blobs) = app();
        blobs.set_fail_uploads(true);
        app.update_draft_name("Cat");
        app.update_draft_description("A cat");
        app.update_draft_attachment(Some(Attachment::new("cat.png", vec![1, 2])));

        let err = app.submit_draft().await.unwrap_err();

        assert!(matches!(err, Error::Upload(_)));
        assert_eq!(app.state().draft.name, "Cat");
        assert!(app.state().draft.attachment.is_some());
        assert!(app.state().last_error.is_some());
        assert_eq!(records.create_calls(), 0);
    }

    #[tokio::test]
    async fn validation_failure_reports_error() {
        let (mut app, records, _) = app();
        app.update_draft_name("Milk");

        let err = app.submit_draft().await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(app
            .state()
            .last_error
            .as_deref()
            .is_some_and(|message| message.contains("description")));
        assert_eq!(records.create_calls(), 0);
    }

    #[tokio::test]
    async fn repeated_delete_is_tolerated() {
        let (mut app, _, _) = app();
        app.update_draft_name("Milk");
        app.update_draft_description("Buy milk");
        let note = app.submit_draft().await.unwrap();

        assert_eq!(app.delete_note(note.id).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(
            app.delete_note(note.id).await.unwrap(),
            DeleteOutcome::AlreadyDeleted
        );
        assert!(app.state().notes.is_empty());
        assert_eq!(app.state().last_error, None);
    }

    #[tokio::test]
    async fn refresh_failure_after_create_keeps_note() {
        let (mut app, records, _) = app();
        app.update_draft_name("Milk");
        app.update_draft_description("Buy milk");
        records.set_fail_list(true);

        let note = app.submit_draft().await.unwrap();

        assert_eq!(records.len(), 1);
        assert!(app.state().draft.is_blank());
        assert!(app.state().last_error.is_some());
        assert_eq!(records.list_calls(), 1);
        assert_eq!(note.name, "Milk");
    }

    #[tokio::test]
    async fn sign_out_resets_state() {
        let (mut app, _, _) = app();
        app.update_draft_name("Milk");
        app.refresh().await.unwrap();

        app.sign_out().await.unwrap();

        assert_eq!(app.state(), &NotesState::default());
    }

    /// Identity provider whose calls never answer in time.
    struct StalledIdentity;

    #[async_trait]
    impl IdentityProvider for StalledIdentity {
        async fn current_user(&self) -> Result<Option<User>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some(User::new("late")))
        }

        async fn sign_out(&self) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    fn stalled_identity_app() -> NotesApp {
        let workflow = NoteSyncWorkflow::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryBlobStore::new()),
        )
        .with_options(WorkflowOptions {
            call_timeout: Duration::from_millis(20),
            ..WorkflowOptions::default()
        });
        NotesApp::new(Arc::new(StalledIdentity), workflow)
    }

    #[tokio::test]
    async fn stalled_identity_lookup_times_out() {
        let app = stalled_identity_app();

        let started = std::time::Instant::now();
        let err = app.current_user().await.unwrap_err();

        assert!(
            matches!(err, Error::Timeout { operation: "identity lookup", .. }),
            "got {err:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn stalled_sign_out_times_out_and_keeps_state() {
        let mut app = stalled_identity_app();
        app.update_draft_name("Milk");

        let err = app.sign_out().await.unwrap_err();

        assert!(matches!(err, Error::Timeout { operation: "sign out", .. }));
        assert_eq!(app.state().draft.name, "Milk");
    }
}
