//! Vestia Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration, and
//! constants shared across the vestia pipeline crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{ErrorCode, ProcessingError};
pub use models::{GarmentCategory, ImageDescriptor, ProcessingResult, StorageRecord};
