//! Configuration module
//!
//! Environment-driven configuration for the pipeline and its collaborators.
//! Every value has a working default so tests and local runs need no setup.

use std::env;
use std::time::Duration;

use crate::constants;

/// Configuration for one pipeline deployment.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Remote processing endpoint (full URL of the submit route).
    pub processing_endpoint: String,
    /// Wall-clock budget per remote attempt.
    pub request_timeout: Duration,
    /// Automatic retries per logical action.
    pub max_retries: u32,
    /// Acquisition size ceiling in bytes.
    pub max_image_bytes: u64,
    /// Hosts the storage relay may download processed assets from.
    pub allowed_source_hosts: Vec<String>,
    /// Lifetime of minted signed URLs.
    pub signed_url_ttl: Duration,
    /// Root directory of the local object store.
    pub storage_path: String,
    /// Base URL signed URLs are built under.
    pub storage_base_url: String,
    /// Secret for signing access URLs.
    pub url_signing_secret: String,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            processing_endpoint: env_or(
                "VESTIA_PROCESSING_ENDPOINT",
                "https://api.vestia.app/v1/garments/process",
            ),
            request_timeout: Duration::from_secs(
                env_parsed("VESTIA_REQUEST_TIMEOUT_SECS", constants::REQUEST_TIMEOUT.as_secs()),
            ),
            max_retries: env_parsed("VESTIA_MAX_RETRIES", constants::MAX_AUTOMATIC_RETRIES),
            max_image_bytes: env_parsed("VESTIA_MAX_IMAGE_BYTES", constants::MAX_IMAGE_BYTES),
            allowed_source_hosts: env_list(
                "VESTIA_ALLOWED_SOURCE_HOSTS",
                &["cdn.vestia.app", "assets.vestia.app"],
            ),
            signed_url_ttl: Duration::from_secs(
                env_parsed("VESTIA_SIGNED_URL_TTL_SECS", constants::SIGNED_URL_TTL.as_secs()),
            ),
            storage_path: env_or("VESTIA_STORAGE_PATH", "/var/lib/vestia/garments"),
            storage_base_url: env_or("VESTIA_STORAGE_BASE_URL", "http://localhost:3000/garments"),
            url_signing_secret: env_or("VESTIA_URL_SIGNING_SECRET", "dev-only-signing-secret"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}
