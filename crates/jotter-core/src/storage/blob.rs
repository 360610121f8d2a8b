//! Blob store contract and object-key helpers.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{Error, Result};

const NONCE_LEN: usize = 8;

/// Keyed binary storage for note attachments.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Durably store `bytes` under `key`. Returns once the write is acknowledged.
    async fn upload(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<()>;

    /// Resolve a URL for `key` that stays valid for roughly `ttl`.
    ///
    /// Fails when the key is absent or the resolution service is unavailable.
    async fn resolve_url(&self, key: &str, ttl: Duration) -> Result<String>;

    /// Remove the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Build an attachment key of the form `{timestamp_ms}-{nonce}-{file name}`.
///
/// The file name is reduced to its last path component and sanitized. The
/// nonce keeps same-millisecond uploads of one file name apart; see
/// [`attachment_nonce`].
pub fn build_attachment_key(file_name: &str, timestamp_ms: i64, nonce: &str) -> String {
    format!("{timestamp_ms}-{nonce}-{}", sanitize_file_name(file_name))
}

/// Short random token for [`build_attachment_key`].
///
/// Taken from the random tail of a UUID v7, so it never repeats the
/// timestamp already at the front of the key.
pub fn attachment_nonce() -> String {
    let id = Uuid::now_v7().simple().to_string();
    id[id.len() - NONCE_LEN..].to_string()
}

pub(crate) fn normalize_object_key(object_key: &str) -> Result<String> {
    let object_key = object_key.trim().trim_matches('/').to_string();
    if object_key.is_empty() {
        return Err(Error::InvalidInput(
            "Attachment object_key cannot be empty".to_string(),
        ));
    }
    if object_key.split('/').any(|segment| segment == "..") {
        return Err(Error::InvalidInput(
            "Attachment object_key must not contain path traversal segments".to_string(),
        ));
    }
    Ok(object_key)
}

pub(crate) fn normalize_content_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn sanitize_file_name(file_name: &str) -> String {
    let trimmed = file_name
        .trim()
        .rsplit(|ch: char| ch == '/' || ch == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    if trimmed.is_empty() {
        return "file".to_string();
    }

    let (stem, ext) = trimmed
        .rsplit_once('.')
        .map_or((trimmed, ""), |parts| parts);
    let stem = sanitize_token(stem);
    let stem = if stem.is_empty() {
        "file".to_string()
    } else {
        stem
    };
    let ext = sanitize_token(ext);

    if ext.is_empty() {
        stem
    } else {
        format!("{stem}.{ext}")
    }
}

fn sanitize_token(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }

    out.trim_matches('-').to_string()
}
