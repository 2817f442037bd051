//! AES-256-GCM encryption of log names and log payloads.
//!
//! Per-purpose keys are derived from an OperationalKek via HKDF:
//! log names use info="log-names", log data uses info="log-data". Every
//! artifact is tagged with the KEK version it was encrypted under so the
//! right key can be selected at decrypt time.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use serde_json::Value;
use zeroize::Zeroize;

use crate::canonical::canonical_json;
use crate::error::CryptoError;
use crate::types::{
    OperationalKek, AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, LOG_DATA_KEY_INFO,
    LOG_NAME_KEY_INFO,
};

/// Resolves an OperationalKek by version id from whatever key material the
/// caller holds (typically a client-side key ring).
pub trait KekResolver {
    fn resolve(&self, version_id: &str) -> Option<OperationalKek>;
}

/// A single OperationalKek resolves only its own version.
impl KekResolver for OperationalKek {
    fn resolve(&self, version_id: &str) -> Option<OperationalKek> {
        (self.version_id() == version_id).then(|| self.clone())
    }
}

/// An immutable encrypted log name or log payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedArtifact {
    pub iv: [u8; AES_GCM_IV_LENGTH],
    /// AEAD ciphertext body, tag excluded.
    pub ciphertext: Vec<u8>,
    pub tag: [u8; AES_GCM_TAG_LENGTH],
    /// KEK version the artifact was encrypted under.
    pub kek_version_id: String,
}

/// Generate a random 12-byte IV for AES-GCM.
fn generate_iv() -> Result<[u8; AES_GCM_IV_LENGTH], CryptoError> {
    let mut iv = [0u8; AES_GCM_IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

fn derive_purpose_key(kek: &OperationalKek, info: &[u8]) -> Result<[u8; AES_KEY_LENGTH], CryptoError> {
    // Salt slot is taken by the operational-KEK derivation above this one;
    // purpose separation here rides on the info string alone.
    crate::hkdf::hkdf_derive(kek.as_bytes(), b"", info)
}

fn encrypt_with_key(
    plaintext: &[u8],
    key: &[u8; AES_KEY_LENGTH],
    kek_version_id: &str,
) -> Result<EncryptedArtifact, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    let iv = generate_iv()?;
    let nonce = Nonce::from_slice(&iv);
    let mut combined = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    // aes-gcm appends the 16-byte tag to the ciphertext; keep them separate
    // so the wire layer can emit the {ciphertext, iv, tag} object form.
    if combined.len() < AES_GCM_TAG_LENGTH {
        return Err(CryptoError::EncryptionFailed(
            "ciphertext shorter than tag".to_string(),
        ));
    }
    let tag_start = combined.len() - AES_GCM_TAG_LENGTH;
    let mut tag = [0u8; AES_GCM_TAG_LENGTH];
    tag.copy_from_slice(&combined[tag_start..]);
    combined.truncate(tag_start);

    Ok(EncryptedArtifact {
        iv,
        ciphertext: combined,
        tag,
        kek_version_id: kek_version_id.to_string(),
    })
}

fn decrypt_with_key(
    artifact: &EncryptedArtifact,
    key: &[u8; AES_KEY_LENGTH],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    let nonce = Nonce::from_slice(&artifact.iv);
    let mut combined = Vec::with_capacity(artifact.ciphertext.len() + AES_GCM_TAG_LENGTH);
    combined.extend_from_slice(&artifact.ciphertext);
    combined.extend_from_slice(&artifact.tag);

    // Fail closed: any AEAD error surfaces as AuthenticationFailed with no
    // cause detail, and no partial plaintext is ever returned.
    cipher
        .decrypt(nonce, combined.as_slice())
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Encrypt a log name under the given OperationalKek.
pub fn encrypt_log_name(
    name: &str,
    kek: &OperationalKek,
) -> Result<EncryptedArtifact, CryptoError> {
    let mut key = derive_purpose_key(kek, LOG_NAME_KEY_INFO)?;
    let result = encrypt_with_key(name.as_bytes(), &key, kek.version_id());
    key.zeroize();
    result
}

/// Encrypt a log payload under the given OperationalKek.
///
/// The payload is canonicalized (sorted-key JSON) before encryption so the
/// same logical document always produces identical plaintext bytes.
pub fn encrypt_log_data(
    data: &Value,
    kek: &OperationalKek,
) -> Result<EncryptedArtifact, CryptoError> {
    let plaintext = canonical_json(data)?;
    let mut key = derive_purpose_key(kek, LOG_DATA_KEY_INFO)?;
    let result = encrypt_with_key(plaintext.as_bytes(), &key, kek.version_id());
    key.zeroize();
    result
}

/// Decrypt a log name, routing to the right key via the artifact's version.
///
/// Fails with `KeyNotAvailable` if the resolver does not hold the version,
/// `AuthenticationFailed` if the AEAD tag does not verify.
pub fn decrypt_log_name(
    artifact: &EncryptedArtifact,
    resolver: &impl KekResolver,
) -> Result<String, CryptoError> {
    let kek = resolver
        .resolve(&artifact.kek_version_id)
        .ok_or_else(|| CryptoError::KeyNotAvailable(artifact.kek_version_id.clone()))?;
    let mut key = derive_purpose_key(&kek, LOG_NAME_KEY_INFO)?;
    let plaintext = decrypt_with_key(artifact, &key);
    key.zeroize();
    String::from_utf8(plaintext?).map_err(|e| CryptoError::Serialization(e.to_string()))
}

/// Decrypt a log payload, routing to the right key via the artifact's version.
pub fn decrypt_log_data(
    artifact: &EncryptedArtifact,
    resolver: &impl KekResolver,
) -> Result<Value, CryptoError> {
    let kek = resolver
        .resolve(&artifact.kek_version_id)
        .ok_or_else(|| CryptoError::KeyNotAvailable(artifact.kek_version_id.clone()))?;
    let mut key = derive_purpose_key(&kek, LOG_DATA_KEY_INFO)?;
    let plaintext = decrypt_with_key(artifact, &key);
    key.zeroize();
    let bytes = plaintext?;
    serde_json::from_slice(&bytes).map_err(|e| CryptoError::Serialization(e.to_string()))
}
