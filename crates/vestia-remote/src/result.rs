//! Interpretation of service responses into domain results.

use crate::wire::ProcessingResponse;
use vestia_core::{ErrorCode, GarmentCategory, ProcessingError, ProcessingResult};

/// Map a decoded service response into a [`ProcessingResult`].
///
/// A null `processedAssetUrl` on a successful response is not an error: the
/// isolation step produced nothing usable, so the result is a degraded
/// success with `used_fallback = true` and the original asset still valid.
/// A success envelope with no body is malformed and classified as a
/// retryable `ServerError`.
pub fn interpret_response(response: ProcessingResponse) -> Result<ProcessingResult, ProcessingError> {
    if !response.success {
        let message = response
            .error
            .unwrap_or_else(|| "processing service reported failure without detail".to_string());
        return Err(ProcessingError::transient(ErrorCode::ServerError, message));
    }

    let data = response.data.ok_or_else(|| {
        ProcessingError::transient(
            ErrorCode::ServerError,
            "success response carried no result body",
        )
    })?;

    Ok(ProcessingResult::new(
        data.original_asset_url,
        data.processed_asset_url,
        data.asset_id,
        data.suggested_category.as_deref().map(GarmentCategory::parse),
        data.category_confidence,
    ))
}
