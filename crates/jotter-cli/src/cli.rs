use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "jotter")]
#[command(about = "Jot down notes with optional image attachments")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the local note database (falls back to JOTTER_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Directory for attachments when R2 is not configured (falls back to JOTTER_BLOB_DIR)
    #[arg(long, global = true, value_name = "PATH")]
    pub blob_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes with their attachment links
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a note
    #[command(alias = "new")]
    Create {
        /// Note name
        #[arg(long)]
        name: String,
        /// Note description
        #[arg(long)]
        description: String,
        /// Image file to attach
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// Delete a note by id
    #[command(alias = "rm")]
    Delete {
        /// Full note id
        id: String,
    },
    /// Greet the signed-in user
    Whoami,
    /// Sign in with Supabase email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
