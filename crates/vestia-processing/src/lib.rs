//! Vestia Processing Library
//!
//! Local image stages of the pipeline: acquisition validation, bounded-edge
//! JPEG re-encoding, and transport encoding. Every stage here is a pure
//! transformation; nothing in this crate performs I/O.

pub mod compressor;
pub mod encoder;
pub mod validator;

pub use compressor::{compress, CompressedImage, CompressionSettings};
pub use encoder::encode_payload;
pub use validator::{AcquisitionValidator, ValidationOutcome};
