//! S3-compatible blob store, configured for Cloudflare R2 by default.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use crate::util::is_http_url;
use crate::{Error, Result};

use super::blob::{normalize_content_type, normalize_object_key, BlobStore};

const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
const ENV_BUCKET: &str = "R2_BUCKET";
const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
const ENV_ENDPOINT_URL: &str = "R2_ENDPOINT_URL";

/// Cloudflare R2 configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct R2Config {
    /// Cloudflare account identifier.
    pub account_id: String,
    /// R2 bucket name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
    /// Explicit S3 endpoint, for non-R2 or local S3-compatible servers.
    pub endpoint_url: Option<String>,
}

impl R2Config {
    /// S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        self.endpoint_url.clone().unwrap_or_else(|| {
            format!("https://{}.r2.cloudflarestorage.com", self.account_id)
        })
    }
}

impl fmt::Debug for R2Config {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("R2Config")
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// R2-backed attachment storage.
///
/// URLs are presigned `GetObject` requests.
#[derive(Clone, Debug)]
pub struct R2BlobStore {
    bucket: String,
    client: Client,
}

impl R2BlobStore {
    #[must_use]
    pub fn new(config: &R2Config) -> Self {
        Self {
            bucket: config.bucket.clone(),
            client: build_s3_client(config),
        }
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|error| storage_error("head_bucket", &self.bucket, None, error))?;
        Ok(())
    }

    async fn ensure_exists(&self, object_key: &str) -> Result<()> {
        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(object_key)
            .send()
            .await
            .map_err(|error| storage_error("head_object", &self.bucket, Some(object_key), error))?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for R2BlobStore {
    async fn upload(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<()> {
        let object_key = normalize_object_key(key)?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes.to_vec()));

        if let Some(content_type) = normalize_content_type(content_type) {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|error| {
            storage_error("put_object", &self.bucket, Some(&object_key), error)
        })?;

        tracing::debug!(bucket = %self.bucket, key = %object_key, "Uploaded attachment");
        Ok(())
    }

    async fn resolve_url(&self, key: &str, ttl: Duration) -> Result<String> {
        let object_key = normalize_object_key(key)?;
        self.ensure_exists(&object_key).await?;

        let presign_config = PresigningConfig::expires_in(ttl)
            .map_err(|error| Error::Config(format!("Invalid presign TTL: {}", sanitize(&error))))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .presigned(presign_config)
            .await
            .map_err(|error| {
                storage_error("presign get_object", &self.bucket, Some(&object_key), error)
            })?;

        Ok(request.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let object_key = normalize_object_key(key)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(|error| {
                storage_error("delete_object", &self.bucket, Some(&object_key), error)
            })?;

        Ok(())
    }
}

/// Parse the `R2_*` variable group.
///
/// Returns `Ok(None)` when no R2 variables are set and an error when only a
/// partial configuration is provided.
pub(crate) fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<R2Config>> {
    let account_id = lookup(ENV_ACCOUNT_ID).map(|value| value.trim().to_string());
    let bucket = lookup(ENV_BUCKET).map(|value| value.trim().to_string());
    let access_key_id = lookup(ENV_ACCESS_KEY_ID).map(|value| value.trim().to_string());
    let secret_access_key = lookup(ENV_SECRET_ACCESS_KEY).map(|value| value.trim().to_string());
    let endpoint_url = lookup(ENV_ENDPOINT_URL).map(|value| value.trim().to_string());

    let any_present = account_id.is_some()
        || bucket.is_some()
        || access_key_id.is_some()
        || secret_access_key.is_some()
        || endpoint_url.is_some();

    if !any_present {
        return Ok(None);
    }

    let mut missing = Vec::new();
    let account_id = required(account_id, ENV_ACCOUNT_ID, &mut missing);
    let bucket = required(bucket, ENV_BUCKET, &mut missing);
    let access_key_id = required(access_key_id, ENV_ACCESS_KEY_ID, &mut missing);
    let secret_access_key = required(secret_access_key, ENV_SECRET_ACCESS_KEY, &mut missing);

    let (Some(account_id), Some(bucket), Some(access_key_id), Some(secret_access_key)) =
        (account_id, bucket, access_key_id, secret_access_key)
    else {
        return Err(Error::Config(format!(
            "R2 configuration is incomplete. Missing: {}",
            missing.join(", ")
        )));
    };

    Ok(Some(R2Config {
        account_id,
        bucket,
        access_key_id,
        secret_access_key,
        endpoint_url: normalize_endpoint_url(endpoint_url)?,
    }))
}

fn required(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    let value = value.filter(|value| !value.is_empty());
    if value.is_none() {
        missing.push(name);
    }
    value
}

fn normalize_endpoint_url(endpoint_url: Option<String>) -> Result<Option<String>> {
    let Some(value) = endpoint_url.filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    if !is_http_url(&value) {
        return Err(Error::Config(format!(
            "{ENV_ENDPOINT_URL} must start with http:// or https://"
        )));
    }

    Ok(Some(value.trim_end_matches('/').to_string()))
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "jotter-core-r2-storage",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

fn storage_error(
    operation: &str,
    bucket: &str,
    object_key: Option<&str>,
    error: impl std::fmt::Display,
) -> Error {
    let target = object_key.map_or_else(|| bucket.to_string(), |key| format!("{bucket}/{key}"));
    Error::BlobStore(format!("R2 {operation} failed for {target}: {}", sanitize(&error)))
}

fn sanitize(error: &impl std::fmt::Display) -> String {
    error.to_string().replace('\n', " ").trim().to_string()
}
