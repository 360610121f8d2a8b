//! Identity providers.
//!
//! Authentication itself is delegated; this module only exposes who is signed
//! in and a way to sign out.

mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use supabase::{normalize_auth_url, AuthSession, AuthUser, SupabaseAuthClient};

/// The signed-in user as shown in the greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The current user, or `None` when nobody is signed in.
    async fn current_user(&self) -> crate::Result<Option<User>>;

    async fn sign_out(&self) -> crate::Result<()>;
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Supabase auth is not configured.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where a signed-in session survives between runs.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// The operating-system user, always signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    username: String,
}

impl LocalIdentity {
    const FALLBACK_USERNAME: &'static str = "local";

    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    /// Read the user name from `USER`, then `USERNAME`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let username = ["USER", "USERNAME"]
            .into_iter()
            .find_map(|key| crate::util::normalize_text_option(lookup(key)))
            .unwrap_or_else(|| Self::FALLBACK_USERNAME.to_string());
        Self { username }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn current_user(&self) -> crate::Result<Option<User>> {
        Ok(Some(User::new(self.username.clone())))
    }

    async fn sign_out(&self) -> crate::Result<()> {
        tracing::debug!("Local identity has no session to end");
        Ok(())
    }
}
