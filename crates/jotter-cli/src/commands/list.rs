use chrono::Utc;
use jotter_core::NotesApp;

use crate::commands::common::{format_note_lines, note_to_list_item, require_user, NoteListItem};
use crate::error::CliError;

pub async fn run_list(app: &mut NotesApp, as_json: bool) -> Result<(), CliError> {
    require_user(app).await?;
    app.refresh().await?;
    let notes = &app.state().notes;

    if as_json {
        let now_ms = Utc::now().timestamp_millis();
        let items = notes
            .iter()
            .map(|display| note_to_list_item(display, now_ms))
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if notes.is_empty() {
        println!("No notes yet.");
    } else {
        for line in format_note_lines(notes) {
            println!("{line}");
        }
    }

    Ok(())
}
