//! Storage relay: move a processed asset from the remote service into
//! durable storage and mint access URLs for it.

use chrono::{TimeDelta, Utc};
use reqwest::header::CONTENT_TYPE;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use vestia_core::config::PipelineConfig;
use vestia_core::constants::ALLOWED_IMAGE_CONTENT_TYPES;
use vestia_core::models::StorageRecord;

use crate::keys::generate_object_key;
use crate::source_gate::validate_source_url;
use crate::traits::{ObjectStore, StorageError};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Source rejected: {0}")]
    DisallowedSource(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Unexpected content type: {0}")]
    InvalidContentType(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Scratch file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Relay policy, derived from [`PipelineConfig`] in production.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Hosts the relay may download from.
    pub allowed_hosts: Vec<String>,
    /// Content types accepted from the source.
    pub allowed_content_types: Vec<String>,
    /// Lifetime of minted signed URLs.
    pub signed_url_ttl: Duration,
    /// Relax the source gate for loopback hosts. Tests and local
    /// development only.
    pub allow_loopback_sources: bool,
}

impl RelayConfig {
    pub fn from_pipeline_config(config: &PipelineConfig) -> Self {
        Self {
            allowed_hosts: config.allowed_source_hosts.clone(),
            allowed_content_types: ALLOWED_IMAGE_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            signed_url_ttl: config.signed_url_ttl,
            allow_loopback_sources: false,
        }
    }
}

/// Moves processed assets into the [`ObjectStore`] and mints signed URLs.
///
/// The relay never trusts the source URL: it must pass the host gate before
/// any connection is opened, and the response content type must be an
/// allowed image type before the body is persisted.
pub struct StorageRelay {
    http: reqwest::Client,
    store: Arc<dyn ObjectStore>,
    config: RelayConfig,
}

/// Best-effort scratch file cleanup on every exit path.
struct ScratchGuard {
    path: PathBuf,
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %self.path.display(), error = %e, "Scratch cleanup failed");
            }
        }
    }
}

impl StorageRelay {
    pub fn new(http: reqwest::Client, store: Arc<dyn ObjectStore>, config: RelayConfig) -> Self {
        Self {
            http,
            store,
            config,
        }
    }

    /// Download the asset at `source_url`, stage it in a scratch file, and
    /// upload it under a fresh owner-scoped key. Returns the storage path.
    ///
    /// The scratch file is removed on success and on every failure path.
    pub async fn relay(&self, source_url: &str, owner_id: Uuid) -> Result<String, RelayError> {
        validate_source_url(
            source_url,
            &self.config.allowed_hosts,
            self.config.allow_loopback_sources,
        )
        .map_err(RelayError::DisallowedSource)?;

        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| RelayError::DownloadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::DownloadFailed(format!(
                "Source returned {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|raw| {
                raw.split(';')
                    .next()
                    .unwrap_or(raw)
                    .trim()
                    .to_ascii_lowercase()
            })
            .ok_or_else(|| RelayError::InvalidContentType("missing Content-Type".to_string()))?;
        if !self
            .config
            .allowed_content_types
            .iter()
            .any(|allowed| allowed == &content_type)
        {
            return Err(RelayError::InvalidContentType(content_type));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RelayError::DownloadFailed(e.to_string()))?;

        let scratch_path = std::env::temp_dir().join(format!(
            "vestia-relay-{}.tmp",
            Uuid::new_v4().simple()
        ));
        let _scratch = ScratchGuard {
            path: scratch_path.clone(),
        };
        tokio::fs::write(&scratch_path, &body).await?;

        let storage_path = generate_object_key(owner_id, extension_for(&content_type));
        let staged = tokio::fs::read(&scratch_path).await?;
        self.store
            .upload(&storage_path, staged, &content_type)
            .await?;

        tracing::info!(
            %owner_id,
            storage_path,
            content_type,
            size_bytes = body.len(),
            "Relayed processed asset into storage"
        );
        Ok(storage_path)
    }

    /// Mint a signed access URL for an object the relay stored.
    pub async fn mint_signed_url(&self, storage_path: &str) -> Result<StorageRecord, RelayError> {
        let ttl = self.config.signed_url_ttl;
        let signed_url = self.store.create_signed_url(storage_path, ttl).await?;
        let ttl_delta = TimeDelta::from_std(ttl)
            .map_err(|e| StorageError::ConfigError(format!("Signed URL TTL out of range: {e}")))?;
        Ok(StorageRecord {
            storage_path: storage_path.to_string(),
            signed_url,
            expires_at: Utc::now() + ttl_delta,
        })
    }

    /// Compensating cleanup after a partial failure. Logged, never fatal:
    /// the caller is already unwinding a more important error.
    pub async fn remove_quietly(&self, storage_path: &str) {
        if let Err(e) = self.store.remove(storage_path).await {
            tracing::warn!(storage_path, error = %e, "Compensating cleanup failed");
        }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "image/heif" => "heif",
        _ => "bin",
    }
}
