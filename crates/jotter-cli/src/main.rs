//! Jotter CLI - notes with optional image attachments from the terminal

mod cli;
mod commands;
mod error;
mod session_store;


use clap::Parser;
use jotter_core::JotterConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::{run_login, run_logout, run_whoami};
use crate::commands::common::{open_app, LocalPaths};
use crate::commands::completions::run_completions;
use crate::commands::create::run_create;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "jotter=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE)),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let config = JotterConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    if let Commands::Login { email, password } = &cli.command {
        return run_login(&config, email, password).await;
    }

    let paths = LocalPaths::resolve(cli.db_path, cli.blob_dir, &config)?;
    let mut app = open_app(&config, &paths)?;

    match cli.command {
        Commands::List { json } => run_list(&mut app, json).await?,
        Commands::Create {
            name,
            description,
            image,
        } => {
            run_create(&mut app, &name, &description, image.as_deref()).await?;
        }
        Commands::Delete { id } => {
            run_delete(&mut app, &id).await?;
        }
        Commands::Whoami => run_whoami(&app).await?,
        Commands::Logout => run_logout(&config, &mut app).await?,
        Commands::Login { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}
