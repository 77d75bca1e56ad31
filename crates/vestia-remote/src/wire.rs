//! Wire types for the remote processing endpoint.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON body POSTed to the processing endpoint.
///
/// One `idempotency_key` is minted per logical user action and reused
/// byte-identically on every automatic retry of that action, so the service
/// can deduplicate repeated submissions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRequest<'a> {
    pub payload: &'a str,
    pub owner_id: Uuid,
    pub mime_type: &'a str,
    pub idempotency_key: Uuid,
}

/// Envelope returned by the processing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<ProcessingResponseData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResponseData {
    pub original_asset_url: String,
    /// Null when the isolation step could not produce a processed asset.
    pub processed_asset_url: Option<String>,
    pub asset_id: String,
    #[serde(default)]
    pub suggested_category: Option<String>,
    #[serde(default)]
    pub category_confidence: Option<f32>,
}
