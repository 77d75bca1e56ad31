//! Vestia Remote Library
//!
//! Client for the remote garment processing service: request construction
//! with a retry-stable idempotency key, a timeout/cancellation race around
//! the in-flight call, bounded automatic retries, and interpretation of the
//! service response into a domain result.

pub mod auth;
pub mod client;
pub mod result;
pub mod retry;
pub mod wire;

pub use auth::{AuthError, StaticTokenProvider, TokenProvider};
pub use client::{GarmentSubmission, ProcessingClient};
pub use result::interpret_response;
pub use retry::RetryPolicy;
pub use wire::{ProcessingRequest, ProcessingResponse, ProcessingResponseData};
