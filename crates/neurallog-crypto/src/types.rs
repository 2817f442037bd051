//! Shared constants and secret key material types.
//!
//! Key hierarchy: MasterSecret → MasterKek → OperationalKek(version).
//! The first two are never persisted anywhere; OperationalKeks are only
//! persisted wrapped inside per-user encrypted blobs.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;

/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// Search token length in bytes (HMAC-SHA256 output).
pub const SEARCH_TOKEN_LENGTH: usize = 32;

/// Minimum accepted PBKDF2 iteration count for master-secret derivation.
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;

/// Default PBKDF2 iteration count.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Master-secret salt: `"NeuralLog-" + tenantId + "-MasterSecret"`.
pub const MASTER_SECRET_SALT_PREFIX: &str = "NeuralLog-";
pub const MASTER_SECRET_SALT_SUFFIX: &str = "-MasterSecret";

/// Master KEK derivation parameters.
pub const MASTER_KEK_SALT: &[u8] = b"NeuralLog-MasterKEK";
pub const MASTER_KEK_INFO: &[u8] = b"master-key-encryption-key";

/// Operational KEK salt prefix; full salt is `"NeuralLog-OpKEK-" + versionId`.
pub const OPERATIONAL_KEK_SALT_PREFIX: &str = "NeuralLog-OpKEK-";
pub const OPERATIONAL_KEK_INFO: &[u8] = b"operational-key-encryption-key";

/// Purpose-specific HKDF info strings for keys derived from an OperationalKek.
pub const LOG_NAME_KEY_INFO: &[u8] = b"log-names";
pub const LOG_DATA_KEY_INFO: &[u8] = b"log-data";
pub const SEARCH_KEY_INFO: &[u8] = b"search-tokens";

/// Root secret for a tenant. Derived on demand from (tenantId, recovery
/// phrase), held only transiently, zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterSecret(pub(crate) [u8; AES_KEY_LENGTH]);

impl MasterSecret {
    pub fn as_bytes(&self) -> &[u8; AES_KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(..)")
    }
}

/// Key-encryption-key derived from the MasterSecret. Never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKek(pub(crate) [u8; AES_KEY_LENGTH]);

impl MasterKek {
    pub fn as_bytes(&self) -> &[u8; AES_KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for MasterKek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKek(..)")
    }
}

/// Versioned working key. Per-purpose subkeys (log names, log data, search
/// tokens) are derived from this via HKDF.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct OperationalKek {
    version_id: String,
    key: [u8; AES_KEY_LENGTH],
}

impl OperationalKek {
    /// Wrap raw key bytes recovered from a decrypted KEK blob.
    pub fn from_bytes(version_id: impl Into<String>, key: [u8; AES_KEY_LENGTH]) -> Self {
        Self {
            version_id: version_id.into(),
            key,
        }
    }

    /// Wrap key bytes of unchecked length, as recovered from a decrypted
    /// blob payload.
    pub fn try_from_slice(
        version_id: impl Into<String>,
        key: &[u8],
    ) -> Result<Self, crate::error::CryptoError> {
        let key: [u8; AES_KEY_LENGTH] =
            key.try_into()
                .map_err(|_| crate::error::CryptoError::InvalidKeyLength {
                    expected: AES_KEY_LENGTH,
                    got: key.len(),
                })?;
        Ok(Self::from_bytes(version_id, key))
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn as_bytes(&self) -> &[u8; AES_KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for OperationalKek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationalKek")
            .field("version_id", &self.version_id)
            .field("key", &"..")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_key_bytes() {
        let kek = OperationalKek::from_bytes("v1", [0x42; AES_KEY_LENGTH]);
        let repr = format!("{:?}", kek);
        assert!(repr.contains("v1"));
        assert!(!repr.contains("42"));
    }

    #[test]
    fn try_from_slice_validates_length() {
        let kek = OperationalKek::try_from_slice("v1", &[0x42; AES_KEY_LENGTH]).unwrap();
        assert_eq!(kek.version_id(), "v1");
        assert_eq!(kek.as_bytes(), &[0x42; AES_KEY_LENGTH]);

        match OperationalKek::try_from_slice("v1", &[0x42; 16]) {
            Err(crate::error::CryptoError::InvalidKeyLength { expected, got }) => {
                assert_eq!(expected, AES_KEY_LENGTH);
                assert_eq!(got, 16);
            }
            other => panic!("expected InvalidKeyLength, got {:?}", other),
        }
    }

    #[test]
    fn master_secret_debug_is_opaque() {
        let secret = MasterSecret([7u8; AES_KEY_LENGTH]);
        assert_eq!(format!("{:?}", secret), "MasterSecret(..)");
    }
}
