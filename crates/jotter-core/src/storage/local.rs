//! Filesystem blob store for offline use.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{Error, Result};

use super::blob::{normalize_object_key, BlobStore};

/// Stores each attachment as a file under a root directory.
///
/// Resolved URLs are `file://` URLs and do not expire.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(normalize_object_key(key)?))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, key: &str, bytes: &[u8], _content_type: Option<&str>) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Readers must never observe a half-written object
        let mut partial = path.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);
        tokio::fs::write(&partial, bytes).await?;
        if let Err(error) = tokio::fs::rename(&partial, &path).await {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(error.into());
        }

        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored attachment");
        Ok(())
    }

    async fn resolve_url(&self, key: &str, _ttl: Duration) -> Result<String> {
        let path = self.object_path(key)?;
        let absolute = tokio::fs::canonicalize(&path)
            .await
            .map_err(|error| local_error("resolve", &path, &error))?;

        Url::from_file_path(&absolute)
            .map(String::from)
            .map_err(|()| {
                Error::BlobStore(format!("{} is not a valid file URL", absolute.display()))
            })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|error| local_error("delete", &path, &error))
    }
}

fn local_error(operation: &str, path: &Path, error: &io::Error) -> Error {
    Error::BlobStore(format!(
        "local {operation} failed for {}: {error}",
        path.display()
    ))
}
