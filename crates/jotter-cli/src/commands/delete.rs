use jotter_core::{DeleteOutcome, NoteId, NotesApp};

use crate::commands::common::require_user;
use crate::error::CliError;

pub fn parse_note_id(raw: &str) -> Result<NoteId, CliError> {
    raw.parse::<NoteId>()
        .map_err(|_| CliError::InvalidNoteId(raw.trim().to_string()))
}

pub async fn run_delete(app: &mut NotesApp, raw_id: &str) -> Result<DeleteOutcome, CliError> {
    let id = parse_note_id(raw_id)?;
    require_user(app).await?;

    let outcome = app.delete_note(id).await?;
    match outcome {
        DeleteOutcome::Deleted => println!("{id}"),
        DeleteOutcome::AlreadyDeleted => println!("Note {id} was already deleted"),
    }
    Ok(outcome)
}
