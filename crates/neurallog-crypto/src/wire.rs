//! External wire formats for KEK blobs, encrypted log entries, and search
//! requests. All binary fields are standard base64.

use serde::{Deserialize, Serialize};

use crate::base64::{base64_decode, base64_encode};
use crate::encryption::EncryptedArtifact;
use crate::error::CryptoError;
use crate::tokens::SearchToken;
use crate::types::{AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, SEARCH_TOKEN_LENGTH};

/// Per-user encrypted KEK distribution: `{ "kekVersionId", "encryptedBlob" }`.
///
/// The blob payload is opaque cargo here; it is encrypted and decrypted by
/// the owning client with a key derived from its own credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KekBlobWire {
    pub kek_version_id: String,
    /// base64 of the encrypted OperationalKek bytes.
    pub encrypted_blob: String,
}

impl KekBlobWire {
    pub fn new(kek_version_id: impl Into<String>, encrypted_blob: &[u8]) -> Self {
        Self {
            kek_version_id: kek_version_id.into(),
            encrypted_blob: base64_encode(encrypted_blob),
        }
    }

    pub fn decode_blob(&self) -> Result<Vec<u8>, CryptoError> {
        base64_decode(&self.encrypted_blob)
    }
}

/// Encrypted payload object form: `{ "ciphertext", "iv", "tag" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedDataWire {
    pub ciphertext: String,
    pub iv: String,
    pub tag: String,
}

/// A complete encrypted log entry as handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedLogEntry {
    /// base64(iv || ciphertext || tag).
    pub encrypted_name: String,
    pub encrypted_data: EncryptedDataWire,
    pub kek_version: String,
    /// base64 of 32-byte HMAC tokens.
    pub search_tokens: Vec<String>,
}

/// Search request body: `{ "tokens": [base64, ...] }`.
///
/// The version each token was generated under is client-side knowledge;
/// the server only ever sees the opaque base64 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub tokens: Vec<String>,
}

impl SearchRequest {
    pub fn from_tokens(tokens: &[SearchToken]) -> Self {
        Self {
            tokens: tokens.iter().map(encode_token).collect(),
        }
    }

    /// Decode the tokens back, re-tagging each with the version the caller
    /// generated them under (the wire form does not carry it).
    pub fn decode_tokens(&self, kek_version: &str) -> Result<Vec<SearchToken>, CryptoError> {
        self.tokens
            .iter()
            .map(|encoded| decode_token(encoded, kek_version))
            .collect()
    }
}

/// Encode a name artifact as `base64(iv || ciphertext || tag)`.
pub fn encode_name_artifact(artifact: &EncryptedArtifact) -> String {
    let mut packed =
        Vec::with_capacity(AES_GCM_IV_LENGTH + artifact.ciphertext.len() + AES_GCM_TAG_LENGTH);
    packed.extend_from_slice(&artifact.iv);
    packed.extend_from_slice(&artifact.ciphertext);
    packed.extend_from_slice(&artifact.tag);
    base64_encode(&packed)
}

/// Decode `base64(iv || ciphertext || tag)` back into an artifact.
pub fn decode_name_artifact(
    encoded: &str,
    kek_version: &str,
) -> Result<EncryptedArtifact, CryptoError> {
    let packed = base64_decode(encoded)?;
    if packed.len() < AES_GCM_IV_LENGTH + AES_GCM_TAG_LENGTH {
        return Err(CryptoError::DataTooShort);
    }
    let mut iv = [0u8; AES_GCM_IV_LENGTH];
    iv.copy_from_slice(&packed[..AES_GCM_IV_LENGTH]);
    let tag_start = packed.len() - AES_GCM_TAG_LENGTH;
    let mut tag = [0u8; AES_GCM_TAG_LENGTH];
    tag.copy_from_slice(&packed[tag_start..]);
    Ok(EncryptedArtifact {
        iv,
        ciphertext: packed[AES_GCM_IV_LENGTH..tag_start].to_vec(),
        tag,
        kek_version_id: kek_version.to_string(),
    })
}

/// Encode a data artifact in the `{ ciphertext, iv, tag }` object form.
pub fn encode_data_artifact(artifact: &EncryptedArtifact) -> EncryptedDataWire {
    EncryptedDataWire {
        ciphertext: base64_encode(&artifact.ciphertext),
        iv: base64_encode(&artifact.iv),
        tag: base64_encode(&artifact.tag),
    }
}

/// Decode the `{ ciphertext, iv, tag }` object form, validating lengths.
pub fn decode_data_artifact(
    wire: &EncryptedDataWire,
    kek_version: &str,
) -> Result<EncryptedArtifact, CryptoError> {
    let iv_bytes = base64_decode(&wire.iv)?;
    let iv: [u8; AES_GCM_IV_LENGTH] = iv_bytes
        .try_into()
        .map_err(|_| CryptoError::DataTooShort)?;
    let tag_bytes = base64_decode(&wire.tag)?;
    let tag: [u8; AES_GCM_TAG_LENGTH] = tag_bytes
        .try_into()
        .map_err(|_| CryptoError::DataTooShort)?;
    Ok(EncryptedArtifact {
        iv,
        ciphertext: base64_decode(&wire.ciphertext)?,
        tag,
        kek_version_id: kek_version.to_string(),
    })
}

/// Assemble the full storage-bound entry from its parts.
pub fn encode_log_entry(
    name: &EncryptedArtifact,
    data: &EncryptedArtifact,
    tokens: &[SearchToken],
) -> EncryptedLogEntry {
    EncryptedLogEntry {
        encrypted_name: encode_name_artifact(name),
        encrypted_data: encode_data_artifact(data),
        kek_version: data.kek_version_id.clone(),
        search_tokens: tokens.iter().map(|t| base64_encode(&t.bytes)).collect(),
    }
}

/// Encode a token for a search request.
pub fn encode_token(token: &SearchToken) -> String {
    base64_encode(&token.bytes)
}

/// Decode a base64 token received on the wire, validating its length.
pub fn decode_token(encoded: &str, kek_version: &str) -> Result<SearchToken, CryptoError> {
    let bytes = base64_decode(encoded)?;
    let bytes: [u8; SEARCH_TOKEN_LENGTH] = bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidInput("search token must be 32 bytes".to_string()))?;
    Ok(SearchToken {
        bytes,
        kek_version_id: kek_version.to_string(),
    })
}
