use std::path::Path;

use jotter_core::{NoteId, NotesApp};

use crate::commands::common::{read_attachment, require_user};
use crate::error::CliError;

pub async fn run_create(
    app: &mut NotesApp,
    name: &str,
    description: &str,
    image: Option<&Path>,
) -> Result<NoteId, CliError> {
    require_user(app).await?;

    let attachment = image.map(read_attachment).transpose()?;
    app.update_draft_name(name);
    app.update_draft_description(description);
    app.update_draft_attachment(attachment);

    let note = app.submit_draft().await?;
    println!("{}", note.id);
    Ok(note.id)
}
