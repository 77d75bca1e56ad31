//! Image acquisition seam.
//!
//! The pipeline never talks to a camera or photo library directly; it asks
//! an [`AcquisitionSource`] for the next image. The source stages the pick
//! into a scratch file and describes it; the pipeline owns the scratch file
//! from that point on and deletes it when the run ends.

use async_trait::async_trait;
use thiserror::Error;
use vestia_core::ImageDescriptor;

/// What one invocation of the source produced.
#[derive(Debug, Clone)]
pub enum Acquisition {
    /// An image was staged into a scratch file.
    Image(ImageDescriptor),
    /// The user dismissed the picker. Silent, not an error.
    Cancelled,
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Picker failed: {0}")]
    Picker(String),
}

/// Supplier of candidate images.
#[async_trait]
pub trait AcquisitionSource: Send + Sync {
    /// Invoke the picker once and stage the result.
    async fn acquire(&self) -> Result<Acquisition, AcquisitionError>;
}
