//! Runtime configuration read from the environment.
//!
//! Every parser takes a lookup closure so tests never touch the process
//! environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::{parse_r2_config, R2Config};
use crate::util::{is_http_url, normalize_text_option};
use crate::workflow::WorkflowOptions;
use crate::{Error, Result};

pub const ENV_DB_PATH: &str = "JOTTER_DB_PATH";
pub const ENV_BLOB_DIR: &str = "JOTTER_BLOB_DIR";
pub const ENV_CALL_TIMEOUT_MS: &str = "JOTTER_CALL_TIMEOUT_MS";
pub const ENV_URL_TTL_SECS: &str = "JOTTER_URL_TTL_SECS";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";

const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_URL_TTL_SECS: u64 = 900;

/// Public Supabase project coordinates.
#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JotterConfig {
    pub db_path: Option<PathBuf>,
    pub blob_dir: Option<PathBuf>,
    pub call_timeout: Duration,
    pub url_ttl: Duration,
    pub r2: Option<R2Config>,
    pub supabase: Option<SupabaseConfig>,
}

impl Default for JotterConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            blob_dir: None,
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            url_ttl: Duration::from_secs(DEFAULT_URL_TTL_SECS),
            r2: None,
            supabase: None,
        }
    }
}

impl JotterConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            db_path: normalize_text_option(lookup(ENV_DB_PATH)).map(PathBuf::from),
            blob_dir: normalize_text_option(lookup(ENV_BLOB_DIR)).map(PathBuf::from),
            call_timeout: Duration::from_millis(parse_positive(
                &lookup,
                ENV_CALL_TIMEOUT_MS,
                DEFAULT_CALL_TIMEOUT_MS,
            )?),
            url_ttl: Duration::from_secs(parse_positive(
                &lookup,
                ENV_URL_TTL_SECS,
                DEFAULT_URL_TTL_SECS,
            )?),
            r2: parse_r2_config(&lookup)?,
            supabase: parse_supabase(&lookup)?,
        })
    }

    pub const fn workflow_options(&self) -> WorkflowOptions {
        WorkflowOptions {
            call_timeout: self.call_timeout,
            url_ttl: self.url_ttl,
        }
    }
}

fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64> {
    let Some(raw) = normalize_text_option(lookup(key)) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(Error::Config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}

fn parse_supabase(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<SupabaseConfig>> {
    let url = normalize_text_option(lookup(ENV_SUPABASE_URL));
    let anon_key = normalize_text_option(lookup(ENV_SUPABASE_ANON_KEY));

    match (url, anon_key) {
        (None, None) => Ok(None),
        (Some(url), Some(anon_key)) => {
            if !is_http_url(&url) {
                return Err(Error::Config(format!(
                    "{ENV_SUPABASE_URL} must include http:// or https://"
                )));
            }
            Ok(Some(SupabaseConfig { url, anon_key }))
        }
        (None, Some(_)) => Err(Error::Config(format!(
            "Supabase configuration is incomplete. Missing: {ENV_SUPABASE_URL}"
        ))),
        (Some(_), None) => Err(Error::Config(format!(
            "Supabase configuration is incomplete. Missing: {ENV_SUPABASE_ANON_KEY}"
        ))),
    }
}
