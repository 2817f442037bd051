use neurallog_crypto::CryptoError;
use thiserror::Error;

use crate::version::KekVersionStatus;

#[derive(Debug, Error)]
pub enum KekError {
    /// A concurrent version transition won the race. The caller decides
    /// whether to retry; this layer never auto-retries.
    #[error("Version transition conflict: expected revision {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("Unknown KEK version: {0}")]
    UnknownVersion(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: KekVersionStatus,
        to: KekVersionStatus,
    },

    #[error("KEK blob for user {user_id} version {version_id} has been revoked")]
    Revoked { user_id: String, version_id: String },

    #[error("User {user_id} is not to be provisioned for version {version_id}")]
    ProvisioningDenied { user_id: String, version_id: String },

    #[error("Tenant has no active KEK version")]
    NoActiveVersion,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
