//! Standard base64 helpers for the wire formats.

use base64ct::{Base64, Encoding};

use crate::error::CryptoError;

/// Base64 encode bytes (standard alphabet, padded).
pub fn base64_encode(data: &[u8]) -> String {
    Base64::encode_string(data)
}

/// Base64 decode a string to bytes.
pub fn base64_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    Base64::decode_vec(s).map_err(|e| CryptoError::Base64(e.to_string()))
}
