//! Supabase session persistence in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use jotter_core::auth::{AuthError, AuthResult, AuthSession, SessionPersistence};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "jotter-cli";

/// One keychain entry per Supabase project.
#[derive(Clone, Debug)]
pub struct KeychainSessionStore {
    account: String,
}

impl KeychainSessionStore {
    pub fn for_project(supabase_url: &str) -> Self {
        let project = supabase_url
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        Self {
            account: format!("supabase_session:{project}"),
        }
    }

    #[cfg(test)]
    pub fn account(&self) -> &str {
        &self.account
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.account).map_err(secure_storage_error)
    }
}

#[cfg(not(test))]
impl SessionPersistence for KeychainSessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(secure_storage_error(error)),
        }
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(secure_storage_error)
    }

    fn clear_session(&self) -> AuthResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(secure_storage_error(error)),
        }
    }
}

#[cfg(test)]
impl SessionPersistence for KeychainSessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store().lock().map_err(secure_storage_error)?;
        guard
            .get(&self.account)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let mut guard = Self::test_store().lock().map_err(secure_storage_error)?;
        guard.insert(self.account.clone(), raw);
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = Self::test_store().lock().map_err(secure_storage_error)?;
        guard.remove(&self.account);
        Ok(())
    }
}

fn secure_storage_error(error: impl std::fmt::Display) -> AuthError {
    AuthError::SecureStorage(error.to_string())
}
