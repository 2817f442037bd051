use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Encrypted data too short")]
    DataTooShort,

    #[error("KDF iteration count too low: minimum {minimum}, got {got}")]
    WeakKdfParameters { minimum: u32, got: u32 },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// AEAD tag verification failed. Deliberately carries no detail about
    /// the cause (wrong key vs. tampered ciphertext) so callers cannot be
    /// used as a key-validity oracle.
    #[error("Authentication failed: ciphertext rejected")]
    AuthenticationFailed,

    #[error("Operational KEK for version {0:?} is not available")]
    KeyNotAvailable(String),

    #[error("canonicalJSON: non-finite number is not representable in JSON")]
    NonFiniteNumber,

    #[error("Invalid base64: {0}")]
    Base64(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
