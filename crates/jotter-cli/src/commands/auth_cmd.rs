use jotter_core::{JotterConfig, NotesApp};

use crate::commands::common::{require_user, supabase_client};
use crate::error::CliError;

pub fn greeting(username: &str) -> String {
    format!("Hello, {username}")
}

pub async fn run_whoami(app: &NotesApp) -> Result<(), CliError> {
    let user = require_user(app).await?;
    println!("{}", greeting(&user.username));
    Ok(())
}

pub async fn run_login(config: &JotterConfig, email: &str, password: &str) -> Result<(), CliError> {
    let supabase = config.supabase.as_ref().ok_or(CliError::AuthNotConfigured)?;
    let session = supabase_client(supabase, config.call_timeout)?
        .sign_in(email, password)
        .await?;
    println!("Signed in as {}", session.user.username());
    Ok(())
}

pub async fn run_logout(config: &JotterConfig, app: &mut NotesApp) -> Result<(), CliError> {
    if config.supabase.is_none() {
        return Err(CliError::AuthNotConfigured);
    }
    app.sign_out().await?;
    println!("Signed out");
    Ok(())
}
