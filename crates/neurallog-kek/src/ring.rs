//! Client-held set of resolved Operational KEKs.
//!
//! A client typically holds the Active version plus any DecryptOnly
//! versions it was provisioned for. The ring routes decryption by version
//! and regenerates query tokens under every version it holds.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use neurallog_crypto::{
    derive_operational_kek, derive_search_key, generate_token, KekResolver, MasterKek,
    OperationalKek, SearchToken,
};

use crate::error::KekError;

/// Operational KEKs held by one client, keyed by version id.
#[derive(Default)]
pub struct KekRing {
    keks: BTreeMap<String, OperationalKek>,
}

impl KekRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kek: OperationalKek) {
        self.keks.insert(kek.version_id().to_string(), kek);
    }

    /// Derive the Operational KEK for `version_id` from the MasterKek and
    /// add it to the ring.
    pub fn derive_and_insert(
        &mut self,
        master_kek: &MasterKek,
        version_id: &str,
    ) -> Result<(), KekError> {
        let kek = derive_operational_kek(master_kek, version_id)?;
        self.insert(kek);
        Ok(())
    }

    /// Add a key recovered from a decrypted KEK blob payload. Rejects
    /// payloads that are not exactly 32 bytes.
    pub fn insert_recovered(
        &mut self,
        version_id: &str,
        key_bytes: &[u8],
    ) -> Result<(), KekError> {
        let kek = OperationalKek::try_from_slice(version_id, key_bytes)?;
        self.insert(kek);
        Ok(())
    }

    pub fn remove(&mut self, version_id: &str) -> bool {
        self.keks.remove(version_id).is_some()
    }

    pub fn contains(&self, version_id: &str) -> bool {
        self.keks.contains_key(version_id)
    }

    /// Held version ids, oldest first.
    pub fn versions(&self) -> Vec<String> {
        self.keks.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keks.is_empty()
    }

    /// Regenerate tokens for the query terms under every held version.
    ///
    /// A version whose search key cannot be derived is skipped rather than
    /// aborting the query; a user may legitimately hold only a subset of
    /// historical keys.
    pub fn query_tokens(&self, terms: &BTreeSet<String>) -> Vec<SearchToken> {
        let mut tokens = Vec::with_capacity(terms.len() * self.keks.len());
        for (version_id, kek) in &self.keks {
            let search_key = match derive_search_key(kek) {
                Ok(key) => key,
                Err(err) => {
                    debug!(version = %version_id, %err, "skipping version for query tokens");
                    continue;
                }
            };
            for term in terms {
                match generate_token(term, &search_key) {
                    Ok(token) => tokens.push(token),
                    Err(err) => {
                        debug!(version = %version_id, %err, "skipping term for query tokens");
                    }
                }
            }
        }
        tokens
    }

    /// Tokens for a single term across all held versions.
    pub fn query_tokens_for_term(&self, term: &str) -> Vec<SearchToken> {
        let mut terms = BTreeSet::new();
        terms.insert(term.to_string());
        self.query_tokens(&terms)
    }
}

impl KekResolver for KekRing {
    fn resolve(&self, version_id: &str) -> Option<OperationalKek> {
        self.keks.get(version_id).cloned()
    }
}
