//! KEK version lifecycle state machine, one manager per tenant.
//!
//! Invariants: exactly one Active version at any time once the first has
//! been created; transitions are monotonic (Active → DecryptOnly →
//! Deprecated; Deprecated is terminal). The active pointer is a versioned
//! record guarded by an optimistic-concurrency revision — concurrent
//! rotations race on it and exactly one wins.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::KekError;

/// Lifecycle status of one KEK version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KekVersionStatus {
    /// The single version new writes are encrypted under.
    Active,
    /// Readable history; never used for new writes.
    DecryptOnly,
    /// Terminal. No blob should still need it for decryption.
    Deprecated,
}

impl fmt::Display for KekVersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::DecryptOnly => "decrypt-only",
            Self::Deprecated => "deprecated",
        };
        f.write_str(s)
    }
}

/// One generation of Operational KEK. Only `status` ever mutates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KekVersion {
    pub id: String,
    pub tenant_id: String,
    pub status: KekVersionStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub reason: String,
}

struct ManagerState {
    versions: Vec<KekVersion>,
    /// version id → users excluded from provisioning (set at rotation).
    denied: HashMap<String, BTreeSet<String>>,
    /// Optimistic-concurrency token; bumped on every transition.
    revision: u64,
    /// Monotonic counter behind the `"v{n}"` version ids.
    seq: u64,
}

/// Per-tenant KEK version manager.
///
/// The revision returned by [`revision`](Self::revision) must be passed back
/// to [`create_version`](Self::create_version) / [`rotate`](Self::rotate);
/// a stale revision loses the race with `KekError::Conflict` rather than
/// silently overwriting a concurrent transition.
pub struct KekVersionManager {
    tenant_id: String,
    state: Mutex<ManagerState>,
}

impl KekVersionManager {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            state: Mutex::new(ManagerState {
                versions: Vec::new(),
                denied: HashMap::new(),
                revision: 0,
                seq: 0,
            }),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Current optimistic-concurrency revision.
    pub fn revision(&self) -> u64 {
        self.state.lock().revision
    }

    /// The single Active version, if any has been created yet.
    pub fn active(&self) -> Option<KekVersion> {
        self.state
            .lock()
            .versions
            .iter()
            .find(|v| v.status == KekVersionStatus::Active)
            .cloned()
    }

    /// The single Active version; fails if none has been created yet.
    ///
    /// Encrypt paths use this rather than [`active`](Self::active) so a
    /// tenant without a provisioned version surfaces a typed error instead
    /// of a missing key downstream.
    pub fn require_active(&self) -> Result<KekVersion, KekError> {
        self.active().ok_or(KekError::NoActiveVersion)
    }

    /// All versions, oldest first.
    pub fn versions(&self) -> Vec<KekVersion> {
        self.state.lock().versions.clone()
    }

    pub fn get(&self, version_id: &str) -> Option<KekVersion> {
        self.state
            .lock()
            .versions
            .iter()
            .find(|v| v.id == version_id)
            .cloned()
    }

    /// Atomically demote the current Active version to DecryptOnly and
    /// insert a new Active version.
    ///
    /// `expected_revision` is the revision the caller last observed; on
    /// mismatch the transition is rejected with `Conflict` and no state
    /// changes.
    pub fn create_version(
        &self,
        expected_revision: u64,
        reason: &str,
        actor: &str,
    ) -> Result<KekVersion, KekError> {
        self.transition(expected_revision, reason, actor, &[])
    }

    /// Rotate: same atomic transition as `create_version`, plus the listed
    /// users are recorded as not-to-be-provisioned for the new version.
    ///
    /// Removed users keep any DecryptOnly keys they already hold; cutting
    /// access to *future* data is all rotation can guarantee.
    pub fn rotate(
        &self,
        expected_revision: u64,
        reason: &str,
        removed_user_ids: &[String],
        actor: &str,
    ) -> Result<KekVersion, KekError> {
        self.transition(expected_revision, reason, actor, removed_user_ids)
    }

    fn transition(
        &self,
        expected_revision: u64,
        reason: &str,
        actor: &str,
        removed_user_ids: &[String],
    ) -> Result<KekVersion, KekError> {
        let mut state = self.state.lock();
        if state.revision != expected_revision {
            warn!(
                tenant = %self.tenant_id,
                expected = expected_revision,
                actual = state.revision,
                "KEK version transition lost the race"
            );
            return Err(KekError::Conflict {
                expected: expected_revision,
                actual: state.revision,
            });
        }

        for version in &mut state.versions {
            if version.status == KekVersionStatus::Active {
                version.status = KekVersionStatus::DecryptOnly;
            }
        }

        state.seq += 1;
        let version = KekVersion {
            id: format!("v{}", state.seq),
            tenant_id: self.tenant_id.clone(),
            status: KekVersionStatus::Active,
            created_at: Utc::now(),
            created_by: actor.to_string(),
            reason: reason.to_string(),
        };
        state.versions.push(version.clone());

        if !removed_user_ids.is_empty() {
            state
                .denied
                .insert(version.id.clone(), removed_user_ids.iter().cloned().collect());
        }

        state.revision += 1;
        info!(
            tenant = %self.tenant_id,
            version = %version.id,
            reason = %reason,
            actor = %actor,
            removed_users = removed_user_ids.len(),
            "activated new KEK version"
        );
        Ok(version)
    }

    /// Mark a DecryptOnly version as Deprecated. Irreversible.
    ///
    /// Whether any blob still needs the version for decryption is the
    /// caller's policy decision; it is not enforced here.
    pub fn deprecate(&self, version_id: &str) -> Result<KekVersion, KekError> {
        let mut state = self.state.lock();
        let version = state
            .versions
            .iter_mut()
            .find(|v| v.id == version_id)
            .ok_or_else(|| KekError::UnknownVersion(version_id.to_string()))?;
        match version.status {
            KekVersionStatus::DecryptOnly => {
                version.status = KekVersionStatus::Deprecated;
                let version = version.clone();
                state.revision += 1;
                info!(tenant = %self.tenant_id, version = %version_id, "deprecated KEK version");
                Ok(version)
            }
            from => Err(KekError::InvalidTransition {
                from,
                to: KekVersionStatus::Deprecated,
            }),
        }
    }

    /// Whether `user_id` was cut from provisioning for `version_id`.
    pub fn is_provisioning_denied(&self, user_id: &str, version_id: &str) -> bool {
        self.state
            .lock()
            .denied
            .get(version_id)
            .is_some_and(|users| users.contains(user_id))
    }
}
