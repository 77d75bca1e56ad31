//! Domain results of the remote processing exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Garment category suggested by the remote categorization step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GarmentCategory {
    Top,
    Bottom,
    Dress,
    Outerwear,
    Footwear,
    Accessory,
    /// Category string the client does not recognize; preserved verbatim so
    /// newer server vocabularies survive a round trip.
    Other(String),
}

impl GarmentCategory {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "top" | "tops" | "shirt" => GarmentCategory::Top,
            "bottom" | "bottoms" | "pants" | "skirt" => GarmentCategory::Bottom,
            "dress" | "dresses" => GarmentCategory::Dress,
            "outerwear" | "jacket" | "coat" => GarmentCategory::Outerwear,
            "footwear" | "shoes" => GarmentCategory::Footwear,
            "accessory" | "accessories" | "bag" => GarmentCategory::Accessory,
            _ => GarmentCategory::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GarmentCategory::Top => "top",
            GarmentCategory::Bottom => "bottom",
            GarmentCategory::Dress => "dress",
            GarmentCategory::Outerwear => "outerwear",
            GarmentCategory::Footwear => "footwear",
            GarmentCategory::Accessory => "accessory",
            GarmentCategory::Other(raw) => raw,
        }
    }
}

/// Interpreted result of a successful remote processing call.
///
/// Invariant: `used_fallback == true` iff `processed_asset_url.is_none()`.
/// [`ProcessingResult::new`] derives the flag from the URL so the invariant
/// holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub original_asset_url: String,
    pub processed_asset_url: Option<String>,
    pub asset_id: String,
    pub used_fallback: bool,
    pub suggested_category: Option<GarmentCategory>,
    pub category_confidence: Option<f32>,
}

impl ProcessingResult {
    pub fn new(
        original_asset_url: String,
        processed_asset_url: Option<String>,
        asset_id: String,
        suggested_category: Option<GarmentCategory>,
        category_confidence: Option<f32>,
    ) -> Self {
        let used_fallback = processed_asset_url.is_none();
        Self {
            original_asset_url,
            processed_asset_url,
            asset_id,
            used_fallback,
            suggested_category,
            category_confidence,
        }
    }

    /// The asset the rest of the workflow should use: the processed asset
    /// when isolation succeeded, otherwise the original.
    pub fn usable_asset_url(&self) -> &str {
        self.processed_asset_url
            .as_deref()
            .unwrap_or(&self.original_asset_url)
    }
}

/// Durable storage location of a relayed asset plus its current access URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub storage_path: String,
    pub signed_url: String,
    pub expires_at: DateTime<Utc>,
}
