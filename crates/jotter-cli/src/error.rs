use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] jotter_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid note id: {0}")]
    InvalidNoteId(String),
    #[error("Could not read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Not signed in. Run `jotter login --email <EMAIL> --password <PASSWORD>` first.")]
    NotSignedIn,
    #[error(
        "Supabase auth is not configured. Set SUPABASE_URL and SUPABASE_ANON_KEY to use login/logout."
    )]
    AuthNotConfigured,
    #[error("Could not determine a data directory; pass --db-path and --blob-dir")]
    NoDataDir,
}

impl From<jotter_core::auth::AuthError> for CliError {
    fn from(error: jotter_core::auth::AuthError) -> Self {
        Self::Auth(error.to_string())
    }
}
