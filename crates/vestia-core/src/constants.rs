//! Pipeline-wide constants.

use std::time::Duration;

/// Maximum accepted image size in bytes (10 MiB).
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions accepted by the acquisition validator.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "heic", "heif", "webp"];

/// Content types the storage relay will accept from the processing service.
pub const ALLOWED_IMAGE_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Wall-clock budget for a single remote processing attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Automatic retries per logical action (on top of the first attempt).
pub const MAX_AUTOMATIC_RETRIES: u32 = 1;

/// Lifetime of a signed access URL.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(900);

/// Bound on automatic re-acquisition after a recoverable validation failure.
pub const MAX_ACQUISITION_ATTEMPTS: u32 = 3;
