//! Zero-knowledge crypto engine for NeuralLog clients.
//!
//! Pure, CPU-bound primitives with no shared mutable state: the key
//! hierarchy (MasterSecret → MasterKek → OperationalKek per version),
//! AES-256-GCM encryption of log names and payloads, and deterministic
//! HMAC-SHA256 search tokens. The server only ever sees ciphertext and
//! opaque tokens.

pub mod base64;
pub mod canonical;
pub mod encryption;
pub mod error;
pub mod hierarchy;
pub mod hkdf;
pub mod tokens;
pub mod types;
pub mod wire;

pub use base64::{base64_decode, base64_encode};
pub use canonical::canonical_json;
pub use encryption::{
    decrypt_log_data, decrypt_log_name, encrypt_log_data, encrypt_log_name, EncryptedArtifact,
    KekResolver,
};
pub use error::CryptoError;
pub use hierarchy::{
    derive_master_kek, derive_master_secret, derive_master_secret_default, derive_operational_kek,
};
pub use hkdf::hkdf_derive;
pub use tokens::{
    derive_search_key, extract_terms, extract_terms_from_text, field_term, generate_token,
    generate_tokens, phrase_term, SearchKey, SearchToken,
};
pub use types::{
    MasterKek, MasterSecret, OperationalKek, AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH,
    AES_KEY_LENGTH, DEFAULT_PBKDF2_ITERATIONS, MIN_PBKDF2_ITERATIONS, SEARCH_TOKEN_LENGTH,
};
pub use wire::{
    decode_data_artifact, decode_name_artifact, decode_token, encode_data_artifact,
    encode_log_entry, encode_name_artifact, encode_token, EncryptedDataWire, EncryptedLogEntry,
    KekBlobWire, SearchRequest,
};
