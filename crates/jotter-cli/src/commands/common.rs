use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jotter_core::auth::{IdentityProvider, LocalIdentity, SupabaseAuthClient};
use jotter_core::config::SupabaseConfig;
use jotter_core::db::{Database, SqliteRecordStore};
use jotter_core::storage::{BlobStore, LocalBlobStore, R2BlobStore};
use jotter_core::{Attachment, DisplayNote, JotterConfig, NoteSyncWorkflow, NotesApp, User};
use serde::Serialize;

use crate::error::CliError;
use crate::session_store::KeychainSessionStore;

const DATA_DIR_NAME: &str = "jotter";

/// Local paths resolved from flags, environment and platform defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPaths {
    pub db_path: PathBuf,
    pub blob_dir: PathBuf,
}

impl LocalPaths {
    pub fn resolve(
        cli_db_path: Option<PathBuf>,
        cli_blob_dir: Option<PathBuf>,
        config: &JotterConfig,
    ) -> Result<Self, CliError> {
        let db_path = match cli_db_path.or_else(|| config.db_path.clone()) {
            Some(path) => path,
            None => default_data_dir()?.join("jotter.db"),
        };
        let blob_dir = match cli_blob_dir.or_else(|| config.blob_dir.clone()) {
            Some(path) => path,
            None => default_data_dir()?.join("blobs"),
        };
        Ok(Self { db_path, blob_dir })
    }
}

fn default_data_dir() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .ok_or(CliError::NoDataDir)
}

pub fn supabase_client(
    supabase: &SupabaseConfig,
    request_timeout: Duration,
) -> Result<SupabaseAuthClient<KeychainSessionStore>, CliError> {
    Ok(SupabaseAuthClient::new(
        &supabase.url,
        supabase.anon_key.clone(),
        KeychainSessionStore::for_project(&supabase.url),
    )?
    .with_request_timeout(request_timeout)?)
}

pub fn identity_provider(config: &JotterConfig) -> Result<Arc<dyn IdentityProvider>, CliError> {
    match &config.supabase {
        Some(supabase) => Ok(Arc::new(supabase_client(supabase, config.call_timeout)?)),
        None => Ok(Arc::new(LocalIdentity::from_env())),
    }
}

fn blob_store(config: &JotterConfig, paths: &LocalPaths) -> Arc<dyn BlobStore> {
    match &config.r2 {
        Some(r2) => {
            tracing::debug!(bucket = %r2.bucket, "Using R2 attachment storage");
            Arc::new(R2BlobStore::new(r2))
        }
        None => {
            tracing::debug!(dir = %paths.blob_dir.display(), "Using local attachment storage");
            Arc::new(LocalBlobStore::new(paths.blob_dir.clone()))
        }
    }
}

/// Wire stores, identity and workflow into an app.
pub fn open_app(config: &JotterConfig, paths: &LocalPaths) -> Result<NotesApp, CliError> {
    let records = Arc::new(SqliteRecordStore::new(Database::open(&paths.db_path)?));
    let workflow = NoteSyncWorkflow::new(records, blob_store(config, paths))
        .with_options(config.workflow_options());
    Ok(NotesApp::new(identity_provider(config)?, workflow))
}

/// Notes are only reachable for a signed-in user.
pub async fn require_user(app: &NotesApp) -> Result<User, CliError> {
    app.current_user().await?.ok_or(CliError::NotSignedIn)
}

pub fn read_attachment(path: &Path) -> Result<Attachment, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "file".to_string(), |name| name.to_string_lossy().into_owned());

    let attachment = Attachment::new(file_name, bytes);
    Ok(match mime_guess::from_path(path).first_raw() {
        Some(content_type) => attachment.with_content_type(content_type),
        None => attachment,
    })
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: i64,
    pub relative_time: String,
}

pub fn note_to_list_item(display: &DisplayNote, now_ms: i64) -> NoteListItem {
    NoteListItem {
        id: display.id().to_string(),
        name: display.name().to_string(),
        description: display.description().to_string(),
        image: display.note.image.clone(),
        image_url: display.image_url.clone(),
        created_at: display.note.created_at,
        relative_time: format_relative_time(display.note.created_at, now_ms),
    }
}

pub fn format_note_lines(notes: &[DisplayNote]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|display| format_note_line(display, now_ms))
        .collect()
}

pub fn format_note_line(display: &DisplayNote, now_ms: i64) -> String {
    let name = preview(display.name(), 24);
    let description = preview(display.description(), 40);
    let relative_time = format_relative_time(display.note.created_at, now_ms);
    let line = format!(
        "{}  {name:<24}  {description:<40}  {relative_time}",
        display.id()
    );

    match &display.image_url {
        Some(url) => format!("{line}  {url}"),
        None if display.note.image.is_some() => format!("{line}  (image unavailable)"),
        None => line,
    }
}

/// First line of `text`, whitespace-collapsed and cut to `max_chars`.
pub fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const WEEK: i64 = 7 * DAY;
    const MONTH: i64 = 30 * DAY;
    const YEAR: i64 = 365 * DAY;

    let diff = now_ms.saturating_sub(timestamp_ms);
    match diff {
        d if d < MINUTE => "just now".to_string(),
        d if d < HOUR => format!("{}m ago", d / MINUTE),
        d if d < DAY => format!("{}h ago", d / HOUR),
        d if d < WEEK => format!("{}d ago", d / DAY),
        d if d < MONTH => format!("{}w ago", d / WEEK),
        d if d < YEAR => format!("{}mo ago", d / MONTH),
        d => format!("{}y ago", d / YEAR),
    }
}
