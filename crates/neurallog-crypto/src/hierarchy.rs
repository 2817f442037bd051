//! Deterministic multi-tier key derivation.
//!
//! MasterSecret = PBKDF2-HMAC-SHA256(recoveryPhrase, "NeuralLog-{tenantId}-MasterSecret")
//! MasterKek    = HKDF-SHA256(MasterSecret, salt="NeuralLog-MasterKEK")
//! OperationalKek(v) = HKDF-SHA256(MasterKek, salt="NeuralLog-OpKEK-{v}")
//!
//! All functions are pure; identical inputs always yield identical keys.
//! Salt diversification by tenant id and version id keeps tenants and key
//! generations cryptographically independent.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::error::CryptoError;
use crate::hkdf::hkdf_derive;
use crate::types::{
    MasterKek, MasterSecret, OperationalKek, AES_KEY_LENGTH, DEFAULT_PBKDF2_ITERATIONS,
    MASTER_KEK_INFO, MASTER_KEK_SALT, MASTER_SECRET_SALT_PREFIX, MASTER_SECRET_SALT_SUFFIX,
    MIN_PBKDF2_ITERATIONS, OPERATIONAL_KEK_INFO, OPERATIONAL_KEK_SALT_PREFIX,
};

/// Derive a tenant's MasterSecret from its recovery phrase.
///
/// Deliberately expensive (PBKDF2 work factor); keep off latency-sensitive
/// paths and run on a background worker with an outer timeout.
///
/// # Arguments
/// * `tenant_id` - Tenant identifier (non-empty), diversifies the salt
/// * `recovery_phrase` - Tenant recovery phrase (non-empty)
/// * `iterations` - PBKDF2 iteration count, minimum 100,000
pub fn derive_master_secret(
    tenant_id: &str,
    recovery_phrase: &str,
    iterations: u32,
) -> Result<MasterSecret, CryptoError> {
    if tenant_id.is_empty() {
        return Err(CryptoError::InvalidInput("empty tenant id".to_string()));
    }
    if recovery_phrase.is_empty() {
        return Err(CryptoError::InvalidInput(
            "empty recovery phrase".to_string(),
        ));
    }
    if iterations < MIN_PBKDF2_ITERATIONS {
        return Err(CryptoError::WeakKdfParameters {
            minimum: MIN_PBKDF2_ITERATIONS,
            got: iterations,
        });
    }

    let salt = format!(
        "{}{}{}",
        MASTER_SECRET_SALT_PREFIX, tenant_id, MASTER_SECRET_SALT_SUFFIX
    );
    let mut secret = [0u8; AES_KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(
        recovery_phrase.as_bytes(),
        salt.as_bytes(),
        iterations,
        &mut secret,
    );
    Ok(MasterSecret(secret))
}

/// `derive_master_secret` with the default iteration count.
pub fn derive_master_secret_default(
    tenant_id: &str,
    recovery_phrase: &str,
) -> Result<MasterSecret, CryptoError> {
    derive_master_secret(tenant_id, recovery_phrase, DEFAULT_PBKDF2_ITERATIONS)
}

/// Derive the MasterKek from a MasterSecret.
pub fn derive_master_kek(master_secret: &MasterSecret) -> Result<MasterKek, CryptoError> {
    let key = hkdf_derive(master_secret.as_bytes(), MASTER_KEK_SALT, MASTER_KEK_INFO)?;
    Ok(MasterKek(key))
}

/// Derive the OperationalKek for a KEK version from the MasterKek.
///
/// Each version id yields an independent key; knowledge of one operational
/// key reveals nothing about another.
pub fn derive_operational_kek(
    master_kek: &MasterKek,
    version_id: &str,
) -> Result<OperationalKek, CryptoError> {
    if version_id.is_empty() {
        return Err(CryptoError::InvalidInput("empty version id".to_string()));
    }
    let salt = format!("{}{}", OPERATIONAL_KEK_SALT_PREFIX, version_id);
    let key = hkdf_derive(master_kek.as_bytes(), salt.as_bytes(), OPERATIONAL_KEK_INFO)?;
    Ok(OperationalKek::from_bytes(version_id, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low-but-valid iteration count keeps the test suite fast.
    const TEST_ITERATIONS: u32 = MIN_PBKDF2_ITERATIONS;

    #[test]
    fn master_secret_is_deterministic() {
        let a = derive_master_secret("acme", "correct horse battery staple", TEST_ITERATIONS)
            .unwrap();
        let b = derive_master_secret("acme", "correct horse battery staple", TEST_ITERATIONS)
            .unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_tenants_different_secrets() {
        let a = derive_master_secret("acme", "correct horse battery staple", TEST_ITERATIONS)
            .unwrap();
        let b = derive_master_secret("globex", "correct horse battery staple", TEST_ITERATIONS)
            .unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_phrases_different_secrets() {
        let a = derive_master_secret("acme", "phrase one", TEST_ITERATIONS).unwrap();
        let b = derive_master_secret("acme", "phrase two", TEST_ITERATIONS).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn default_iterations_match_explicit_call() {
        let a = derive_master_secret_default("acme", "correct horse battery staple").unwrap();
        let b = derive_master_secret(
            "acme",
            "correct horse battery staple",
            DEFAULT_PBKDF2_ITERATIONS,
        )
        .unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn rejects_empty_tenant() {
        assert!(matches!(
            derive_master_secret("", "phrase", TEST_ITERATIONS),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_empty_phrase() {
        assert!(matches!(
            derive_master_secret("acme", "", TEST_ITERATIONS),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_weak_iteration_count() {
        assert!(matches!(
            derive_master_secret("acme", "phrase", 1_000),
            Err(CryptoError::WeakKdfParameters { .. })
        ));
    }

    #[test]
    fn master_kek_differs_from_master_secret() {
        let secret =
            derive_master_secret("acme", "correct horse battery staple", TEST_ITERATIONS).unwrap();
        let kek = derive_master_kek(&secret).unwrap();
        assert_ne!(kek.as_bytes(), secret.as_bytes());
    }

    #[test]
    fn operational_keks_are_version_independent() {
        let secret =
            derive_master_secret("acme", "correct horse battery staple", TEST_ITERATIONS).unwrap();
        let master_kek = derive_master_kek(&secret).unwrap();
        let v1 = derive_operational_kek(&master_kek, "v1").unwrap();
        let v2 = derive_operational_kek(&master_kek, "v2").unwrap();
        assert_ne!(v1.as_bytes(), v2.as_bytes());
        assert_eq!(v1.version_id(), "v1");
        assert_eq!(v2.version_id(), "v2");
    }

    #[test]
    fn operational_kek_is_deterministic() {
        let secret =
            derive_master_secret("acme", "correct horse battery staple", TEST_ITERATIONS).unwrap();
        let master_kek = derive_master_kek(&secret).unwrap();
        let a = derive_operational_kek(&master_kek, "v1").unwrap();
        let b = derive_operational_kek(&master_kek, "v1").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn rejects_empty_version_id() {
        let secret =
            derive_master_secret("acme", "correct horse battery staple", TEST_ITERATIONS).unwrap();
        let master_kek = derive_master_kek(&secret).unwrap();
        assert!(matches!(
            derive_operational_kek(&master_kek, ""),
            Err(CryptoError::InvalidInput(_))
        ));
    }
}
