//! URL-safe base64 used for the email and token path segments.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use crate::error::VerificationError;

pub fn encode(value: impl AsRef<[u8]>) -> String {
    URL_SAFE.encode(value)
}

pub fn decode(value: &str) -> Result<Vec<u8>, VerificationError> {
    URL_SAFE
        .decode(value)
        .map_err(|e| VerificationError::Decode(e.to_string()))
}

/// Decodes `value` and requires the result to be UTF-8.
pub fn decode_to_string(value: &str) -> Result<String, VerificationError> {
    String::from_utf8(decode(value)?).map_err(|e| VerificationError::Decode(e.to_string()))
}
