//! HKDF-SHA256, the workhorse behind every non-root key in the hierarchy.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::CryptoError;
use crate::types::AES_KEY_LENGTH;

/// HKDF-SHA256 extract-and-expand to a fixed 32-byte key.
///
/// `salt` and `info` carry the domain separation; every call site in this
/// crate uses a distinct (salt, info) pair so derived keys never collide
/// across purposes.
pub fn hkdf_derive(
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
) -> Result<[u8; AES_KEY_LENGTH], CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; AES_KEY_LENGTH];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::EncryptionFailed(format!("HKDF expand: {}", e)))?;
    Ok(okm)
}
