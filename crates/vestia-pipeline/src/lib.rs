//! Vestia Pipeline Library
//!
//! Orchestrates the capture-to-storage flow: acquisition, validation with
//! bounded re-acquisition, compression, transport encoding, remote
//! processing, and the storage relay. Cancellation is honored at every stage
//! boundary and inside the remote call.

pub mod acquisition;
pub mod pipeline;

pub use acquisition::{Acquisition, AcquisitionError, AcquisitionSource};
pub use pipeline::{GarmentPipeline, PipelineError, PipelineOutcome, PipelinePhase};
