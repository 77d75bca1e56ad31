//! Auth collaborator seam.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no session token available")]
    Missing,
    #[error("token rejected: {0}")]
    Rejected(String),
}

/// Supplies a short-lived bearer token on demand.
///
/// The pipeline never caches tokens itself; each attempt asks the provider so
/// a refreshed session is picked up between retries. Any provider failure is
/// classified as `AuthExpired` by the client.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, AuthError>;
}

/// Fixed-token provider for tests and single-session tools.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }
}
