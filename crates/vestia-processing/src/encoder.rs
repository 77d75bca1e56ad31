//! Transport encoding of compressed image bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Encode the payload as standard base64 in a single unit.
///
/// No chunking: the maximum supported image size is bounded by what the
/// transport and the processing service accept as one payload. That bound is
/// deliberate; upstream compression keeps payloads within it.
pub fn encode_payload(data: &[u8]) -> String {
    STANDARD.encode(data)
}
