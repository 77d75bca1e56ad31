//! Local filesystem storage backend with HMAC-signed expiring URLs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::traits::{ObjectStore, StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

/// Filesystem-backed [`ObjectStore`].
///
/// Signed URLs have the shape
/// `{base_url}/{storage_path}?expires={unix_seconds}&signature={hex}` where
/// the signature is HMAC-SHA256 over `"{storage_path}:{expires}"`. The URL
/// can be verified offline with [`LocalStore::verify_signed_url`]; no state
/// is kept per signature.
pub struct LocalStore {
    base_path: PathBuf,
    base_url: String,
    secret: Vec<u8>,
}

impl LocalStore {
    pub fn new(
        base_path: impl Into<PathBuf>,
        base_url: impl Into<String>,
        secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
        })
    }

    /// Map a storage key onto the local filesystem, rejecting keys that
    /// could escape the base directory.
    fn key_to_path(&self, storage_path: &str) -> StorageResult<PathBuf> {
        if storage_path.is_empty()
            || storage_path.starts_with('/')
            || storage_path.split('/').any(|seg| seg == "..")
        {
            return Err(StorageError::InvalidKey(storage_path.to_string()));
        }
        Ok(self.base_path.join(storage_path))
    }

    fn signature(&self, storage_path: &str, expires: i64) -> StorageResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        mac.update(storage_path.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a signed URL against the store's secret at time `at`.
    ///
    /// A URL is valid when the signature matches and `at` has not passed the
    /// embedded expiry. Returns `false` for malformed URLs rather than
    /// erroring; callers only care about accept or reject.
    pub fn verify_signed_url_at(&self, signed_url: &str, at: DateTime<Utc>) -> bool {
        let Some(rest) = signed_url.strip_prefix(&self.base_url) else {
            return false;
        };
        let Some((path_part, query)) = rest.split_once('?') else {
            return false;
        };
        let storage_path = path_part.trim_start_matches('/');

        let mut expires: Option<i64> = None;
        let mut signature: Option<&str> = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => expires = v.parse().ok(),
                Some(("signature", v)) => signature = Some(v),
                _ => {}
            }
        }
        let (Some(expires), Some(signature)) = (expires, signature) else {
            return false;
        };

        if at.timestamp() > expires {
            return false;
        }
        match self.signature(storage_path, expires) {
            Ok(expected) => constant_time_eq(expected.as_bytes(), signature.as_bytes()),
            Err(_) => false,
        }
    }

    /// [`LocalStore::verify_signed_url_at`] against the current clock.
    pub fn verify_signed_url(&self, signed_url: &str) -> bool {
        self.verify_signed_url_at(signed_url, Utc::now())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn upload(
        &self,
        storage_path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = self.key_to_path(storage_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &data).await?;
        tracing::debug!(
            storage_path,
            content_type,
            size_bytes = data.len(),
            "Stored object"
        );
        Ok(())
    }

    async fn create_signed_url(&self, storage_path: &str, ttl: Duration) -> StorageResult<String> {
        // Validate the key even though signing itself never touches disk.
        self.key_to_path(storage_path)?;
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        let signature = self.signature(storage_path, expires)?;
        Ok(format!(
            "{}/{storage_path}?expires={expires}&signature={signature}",
            self.base_url
        ))
    }

    async fn remove(&self, storage_path: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(storage_path, "Removed object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(e.to_string())),
        }
    }

    async fn exists(&self, storage_path: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_path)?;
        Ok(fs::try_exists(&path).await?)
    }
}
