//! Supabase GoTrue password-grant client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::util::{compact_text, is_http_url, unix_timestamp_now};

use super::{AuthError, AuthResult, IdentityProvider, SessionPersistence, User};

const EXPIRY_SKEW_SECONDS: i64 = 60;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

impl AuthUser {
    /// Email when the account has one, otherwise the user id.
    pub fn username(&self) -> &str {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .unwrap_or(self.id.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> AuthResult<Self> {
        let auth_url = normalize_auth_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        Ok(Self {
            auth_url,
            anon_key,
            client: http_client(DEFAULT_REQUEST_TIMEOUT)?,
            store,
        })
    }

    /// Bound every HTTP request made by this client to `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> AuthResult<Self> {
        self.client = http_client(timeout)?;
        Ok(self)
    }

    /// Load the persisted session, refreshing it when it is about to expire.
    ///
    /// A session that cannot be refreshed is cleared.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored.is_expired() {
            return Ok(Some(stored));
        }

        match self.refresh_session(&stored.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!(%error, "Failed to refresh persisted session");
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        if email.trim().is_empty() {
            return Err(AuthError::Api("Email is required".to_string()));
        }
        if password.trim().is_empty() {
            return Err(AuthError::Api("Password is required".to_string()));
        }

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });
        let session = self
            .token_request("password", &payload)
            .await?
            .into_session()?;

        self.store.save_session(&session)?;
        tracing::info!(user = session.user.username(), "Signed in");
        Ok(session)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let payload = serde_json::json!({ "refresh_token": refresh_token });
        let session = self
            .token_request("refresh_token", &payload)
            .await?
            .into_session()?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    /// Revoke `access_token` server-side and forget the stored session.
    ///
    /// An already-invalid token (401) counts as revoked.
    pub async fn revoke(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !(status.is_success() || status == StatusCode::UNAUTHORIZED) {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        self.store.clear_session()?;
        Ok(())
    }

    async fn token_request(
        &self,
        grant_type: &str,
        payload: &serde_json::Value,
    ) -> AuthResult<TokenResponse> {
        let request = self.public_request(
            self.client
                .post(format!("{}/token", self.auth_url))
                .query(&[("grant_type", grant_type)])
                .json(payload),
        );

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<TokenResponse>().await?)
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }
}

fn http_client(timeout: Duration) -> AuthResult<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

#[async_trait]
impl<S: SessionPersistence> IdentityProvider for SupabaseAuthClient<S> {
    async fn current_user(&self) -> crate::Result<Option<User>> {
        let session = self.restore_session().await?;
        Ok(session.map(|session| User::new(session.user.username())))
    }

    async fn sign_out(&self) -> crate::Result<()> {
        match self.store.load_session()? {
            Some(session) => self.revoke(&session.access_token).await?,
            None => self.store.clear_session()?,
        }
        tracing::info!("Signed out");
        Ok(())
    }
}

pub fn normalize_auth_url(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must not be empty",
        ));
    }
    if !is_http_url(trimmed) {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must include http:// or https://",
        ));
    }
    if trimmed.ends_with("/auth/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/auth/v1"))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<TokenUser>,
}

impl TokenResponse {
    fn into_session(self) -> AuthResult<AuthSession> {
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
        });

        match (self.access_token, self.refresh_token, expires_at, self.user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user: AuthUser {
                        id: user.id,
                        email: user.email,
                    },
                })
            }
            _ => Err(AuthError::Api(
                "Token response did not include an active session".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorResponse>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let body = compact_text(body);
    if body.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{body} ({})", status.as_u16())
    }
}
