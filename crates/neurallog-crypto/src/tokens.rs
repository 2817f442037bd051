//! Term extraction and deterministic HMAC search tokens.
//!
//! Token = HMAC-SHA256(searchKey(version), normalizedTerm). Determinism is
//! what makes the server-side index usable at all; unlinkability across
//! tenants rides on HMAC key secrecy.

use std::collections::BTreeSet;
use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::canonical::canonical_json;
use crate::error::CryptoError;
use crate::hkdf::hkdf_derive;
use crate::types::{OperationalKek, AES_KEY_LENGTH, SEARCH_KEY_INFO, SEARCH_TOKEN_LENGTH};

type HmacSha256 = Hmac<Sha256>;

/// Minimum term length; shorter tokens are discarded during extraction.
const MIN_TERM_LENGTH: usize = 3;

/// Version-scoped HMAC key for search token generation.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SearchKey {
    version_id: String,
    key: [u8; AES_KEY_LENGTH],
}

impl SearchKey {
    pub fn version_id(&self) -> &str {
        &self.version_id
    }
}

impl fmt::Debug for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchKey")
            .field("version_id", &self.version_id)
            .field("key", &"..")
            .finish()
    }
}

/// An opaque 32-byte search token, tagged with the KEK version of the key
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchToken {
    pub bytes: [u8; SEARCH_TOKEN_LENGTH],
    pub kek_version_id: String,
}

/// Derive the search key for an OperationalKek.
pub fn derive_search_key(kek: &OperationalKek) -> Result<SearchKey, CryptoError> {
    let key = hkdf_derive(kek.as_bytes(), b"", SEARCH_KEY_INFO)?;
    Ok(SearchKey {
        version_id: kek.version_id().to_string(),
        key,
    })
}

/// Extract the searchable term set from a log payload.
///
/// Canonical string form, lowercased, non-word characters replaced with
/// spaces, split on whitespace, terms of length <= 2 dropped, deduplicated.
pub fn extract_terms(content: &serde_json::Value) -> Result<BTreeSet<String>, CryptoError> {
    let text = canonical_json(content)?;
    Ok(extract_terms_from_text(&text))
}

/// Term extraction over an already-stringified form.
pub fn extract_terms_from_text(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    let normalized: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect();
    normalized
        .split_whitespace()
        .filter(|t| t.len() >= MIN_TERM_LENGTH)
        .map(str::to_string)
        .collect()
}

/// Generate the token for a single normalized term.
pub fn generate_token(term: &str, search_key: &SearchKey) -> Result<SearchToken, CryptoError> {
    if term.is_empty() {
        return Err(CryptoError::InvalidInput("empty search term".to_string()));
    }
    let mut mac = HmacSha256::new_from_slice(&search_key.key)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    mac.update(term.as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut bytes = [0u8; SEARCH_TOKEN_LENGTH];
    bytes.copy_from_slice(&digest);
    Ok(SearchToken {
        bytes,
        kek_version_id: search_key.version_id.clone(),
    })
}

/// Generate tokens for a term set under one search key.
pub fn generate_tokens(
    terms: &BTreeSet<String>,
    search_key: &SearchKey,
) -> Result<Vec<SearchToken>, CryptoError> {
    terms
        .iter()
        .map(|term| generate_token(term, search_key))
        .collect()
}

/// Namespaced term for field-value search: `field:{name}:{value}`.
///
/// Fed through the same HMAC primitive as plain terms; no separate
/// cryptographic mechanism.
pub fn field_term(name: &str, value: &str) -> String {
    format!("field:{}:{}", name.to_lowercase(), value.to_lowercase())
}

/// Namespaced term for exact-phrase search: `phrase:{w1 w2 ...}`.
pub fn phrase_term(words: &[&str]) -> String {
    format!("phrase:{}", words.join(" ").to_lowercase())
}
