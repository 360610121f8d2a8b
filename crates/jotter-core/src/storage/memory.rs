//! In-memory blob store

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

use super::blob::{normalize_content_type, BlobStore};

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

#[derive(Debug, Default)]
struct Faults {
    unresolvable: HashSet<String>,
    resolve_delays: HashMap<String, Duration>,
}

/// Blob store held in process memory.
///
/// URLs look like `memory://{key}?expires={unix seconds}`. Uploads, deletes
/// and individual resolutions can be made to fail or stall for tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
    faults: Mutex<Faults>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    upload_calls: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make resolution of `key` fail even when the blob exists.
    pub fn make_unresolvable(&self, key: impl Into<String>) {
        lock(&self.faults).unresolvable.insert(key.into());
    }

    /// Delay resolution of `key` by `delay`.
    pub fn delay_resolution(&self, key: impl Into<String>, delay: Duration) {
        lock(&self.faults).resolve_delays.insert(key.into(), delay);
    }

    /// Insert a blob directly, bypassing upload faults.
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        lock(&self.blobs).insert(
            key.into(),
            StoredBlob {
                bytes: bytes.into(),
                content_type: None,
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.blobs).contains_key(key)
    }

    pub fn bytes(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.blobs).get(key).map(|blob| blob.bytes.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        lock(&self.blobs)
            .get(key)
            .and_then(|blob| blob.content_type.clone())
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        lock(&self.blobs).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.blobs).is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<()> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::BlobStore(format!("memory upload rejected for {key}")));
        }

        lock(&self.blobs).insert(
            key.to_string(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_type: normalize_content_type(content_type),
            },
        );
        Ok(())
    }

    async fn resolve_url(&self, key: &str, ttl: Duration) -> Result<String> {
        let delay = lock(&self.faults).resolve_delays.get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if lock(&self.faults).unresolvable.contains(key) {
            return Err(Error::BlobStore(format!("memory resolution unavailable for {key}")));
        }
        if !self.contains(key) {
            return Err(Error::BlobStore(format!("no blob stored under {key}")));
        }

        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = chrono::Utc::now().timestamp().saturating_add(ttl_secs);
        Ok(format!("memory://{key}?expires={expires}"))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::BlobStore(format!("memory delete rejected for {key}")));
        }
        lock(&self.blobs)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::BlobStore(format!("no blob stored under {key}")))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
