//! Candidate validation and base64 decoding of the stereo payload.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

/// Standard alphabet; producers are inconsistent about trailing `=` padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[inline]
fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')
}

/// Accept `raw` as a payload if it consists only of base64 characters and
/// whitespace, and is longer than `min_len` characters as found in the document.
/// Returns the value with whitespace removed.
pub fn accept_candidate(raw: &str, min_len: usize) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if !raw
        .bytes()
        .all(|b| is_base64_byte(b) || b.is_ascii_whitespace())
    {
        return None;
    }
    // Only ASCII survives the check above, so bytes and characters agree.
    if raw.len() <= min_len {
        return None;
    }
    Some(raw.chars().filter(|c| !c.is_ascii_whitespace()).collect())
}

/// Decode an accepted payload into image bytes.
pub fn decode_payload(base64: &str) -> Result<Vec<u8>, base64::DecodeError> {
    PAYLOAD_ENGINE.decode(base64)
}
