//! Domain models shared across the pipeline crates.

pub mod image;
pub mod processing;

pub use image::ImageDescriptor;
pub use processing::{GarmentCategory, ProcessingResult, StorageRecord};
