//! KEK blob storage adapter.
//!
//! A blob is a per-user encrypted distribution of one Operational KEK. The
//! plaintext key bytes inside are opaque cargo at this layer — the owning
//! client encrypts and decrypts the blob with a key derived from its own
//! credential, outside this trust boundary.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tracing::debug;

use neurallog_crypto::KekBlobWire;

use crate::error::KekError;
use crate::version::KekVersionManager;

/// One stored blob, owned by the (tenant, user, version) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KekBlob {
    pub tenant_id: String,
    pub user_id: String,
    pub kek_version_id: String,
    pub encrypted_blob: Vec<u8>,
}

impl KekBlob {
    /// The `{ kekVersionId, encryptedBlob }` wire form.
    pub fn to_wire(&self) -> KekBlobWire {
        KekBlobWire::new(self.kek_version_id.clone(), &self.encrypted_blob)
    }
}

/// Thin protocol over the external blob storage collaborator.
pub trait KekBlobStore {
    /// Upsert the blob for (user, version).
    fn provision_blob(
        &self,
        user_id: &str,
        version_id: &str,
        encrypted_blob: &[u8],
    ) -> Result<(), KekError>;

    /// All live blobs for one user, oldest version first.
    fn get_user_blobs(&self, user_id: &str) -> Result<Vec<KekBlob>, KekError>;

    /// Delete the blob for (user, version). Effective for future fetches
    /// only; a copy the client already cached cannot be erased.
    fn revoke_blob(&self, user_id: &str, version_id: &str) -> Result<(), KekError>;
}

/// Provision a blob after checking the version manager's denylist.
///
/// Users listed in `rotate(..., removed_user_ids, ...)` must never receive
/// the new version's blob.
pub fn provision_checked(
    manager: &KekVersionManager,
    store: &impl KekBlobStore,
    user_id: &str,
    version_id: &str,
    encrypted_blob: &[u8],
) -> Result<(), KekError> {
    if manager.is_provisioning_denied(user_id, version_id) {
        return Err(KekError::ProvisioningDenied {
            user_id: user_id.to_string(),
            version_id: version_id.to_string(),
        });
    }
    store.provision_blob(user_id, version_id, encrypted_blob)
}

struct BlobState {
    /// (user id, version id) → encrypted blob bytes.
    blobs: HashMap<(String, String), Vec<u8>>,
    /// Revocation tombstones; provisioning a revoked pair is rejected.
    revoked: HashSet<(String, String)>,
}

/// In-memory `KekBlobStore`, the reference backend used by tests and local
/// tooling.
pub struct MemoryBlobStore {
    tenant_id: String,
    state: Mutex<BlobState>,
}

impl MemoryBlobStore {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            state: Mutex::new(BlobState {
                blobs: HashMap::new(),
                revoked: HashSet::new(),
            }),
        }
    }
}

impl KekBlobStore for MemoryBlobStore {
    fn provision_blob(
        &self,
        user_id: &str,
        version_id: &str,
        encrypted_blob: &[u8],
    ) -> Result<(), KekError> {
        let key = (user_id.to_string(), version_id.to_string());
        let mut state = self.state.lock();
        if state.revoked.contains(&key) {
            return Err(KekError::Revoked {
                user_id: user_id.to_string(),
                version_id: version_id.to_string(),
            });
        }
        state.blobs.insert(key, encrypted_blob.to_vec());
        debug!(tenant = %self.tenant_id, user = %user_id, version = %version_id, "provisioned KEK blob");
        Ok(())
    }

    fn get_user_blobs(&self, user_id: &str) -> Result<Vec<KekBlob>, KekError> {
        let state = self.state.lock();
        let mut blobs: Vec<KekBlob> = state
            .blobs
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|((user, version), bytes)| KekBlob {
                tenant_id: self.tenant_id.clone(),
                user_id: user.clone(),
                kek_version_id: version.clone(),
                encrypted_blob: bytes.clone(),
            })
            .collect();
        blobs.sort_by(|a, b| a.kek_version_id.cmp(&b.kek_version_id));
        Ok(blobs)
    }

    fn revoke_blob(&self, user_id: &str, version_id: &str) -> Result<(), KekError> {
        let key = (user_id.to_string(), version_id.to_string());
        let mut state = self.state.lock();
        state.blobs.remove(&key);
        state.revoked.insert(key);
        debug!(tenant = %self.tenant_id, user = %user_id, version = %version_id, "revoked KEK blob");
        Ok(())
    }
}
