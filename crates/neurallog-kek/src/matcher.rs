//! Version-aware token-set intersection over posting lists.
//!
//! Per KEK version, a document matches when every query token of that
//! version has it in its posting list (AND). Results are unioned across
//! versions (OR) so documents written under older keys stay findable by a
//! client that still holds those keys.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::Mutex;
use tracing::debug;

use neurallog_crypto::{SearchToken, SEARCH_TOKEN_LENGTH};

use crate::error::KekError;

/// Posting-list storage collaborator: token → set of document ids.
///
/// Writes are additive; queries are read-only and do not interfere with
/// concurrent writes.
pub trait PostingStore {
    fn put_posting(&self, token: &SearchToken, doc_id: &str) -> Result<(), KekError>;

    fn get_posting(&self, token: &SearchToken) -> Result<BTreeSet<String>, KekError>;
}

/// Intersect posting lists per KEK version, then union across versions.
///
/// Within one version the intersection short-circuits to empty as soon as
/// any single token has an empty posting list.
pub fn match_tokens(
    tokens: &[SearchToken],
    store: &impl PostingStore,
) -> Result<BTreeSet<String>, KekError> {
    let mut by_version: BTreeMap<&str, Vec<&SearchToken>> = BTreeMap::new();
    for token in tokens {
        by_version
            .entry(token.kek_version_id.as_str())
            .or_default()
            .push(token);
    }

    let mut results = BTreeSet::new();
    for (version, version_tokens) in by_version {
        let mut candidates: Option<BTreeSet<String>> = None;
        for token in version_tokens {
            let posting = store.get_posting(token)?;
            if posting.is_empty() {
                candidates = None;
                break;
            }
            candidates = Some(match candidates {
                None => posting,
                Some(current) => current.intersection(&posting).cloned().collect(),
            });
            if candidates.as_ref().is_some_and(BTreeSet::is_empty) {
                candidates = None;
                break;
            }
        }
        if let Some(matched) = candidates {
            debug!(version = %version, matches = matched.len(), "per-version intersection");
            results.extend(matched);
        }
    }
    Ok(results)
}

/// Index every token of a document.
pub fn index_document(
    tokens: &[SearchToken],
    doc_id: &str,
    store: &impl PostingStore,
) -> Result<(), KekError> {
    for token in tokens {
        store.put_posting(token, doc_id)?;
    }
    Ok(())
}

/// In-memory `PostingStore`. Tokens are keyed by their opaque 32 bytes, the
/// same way an untrusted server would index them.
#[derive(Default)]
pub struct MemoryPostingStore {
    postings: Mutex<HashMap<[u8; SEARCH_TOKEN_LENGTH], BTreeSet<String>>>,
}

impl MemoryPostingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostingStore for MemoryPostingStore {
    fn put_posting(&self, token: &SearchToken, doc_id: &str) -> Result<(), KekError> {
        self.postings
            .lock()
            .entry(token.bytes)
            .or_default()
            .insert(doc_id.to_string());
        Ok(())
    }

    fn get_posting(&self, token: &SearchToken) -> Result<BTreeSet<String>, KekError> {
        Ok(self
            .postings
            .lock()
            .get(&token.bytes)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(byte: u8, version: &str) -> SearchToken {
        SearchToken {
            bytes: [byte; SEARCH_TOKEN_LENGTH],
            kek_version_id: version.to_string(),
        }
    }

    #[test]
    fn single_token_returns_its_posting_list() {
        let store = MemoryPostingStore::new();
        store.put_posting(&token(1, "v1"), "doc-a").unwrap();
        store.put_posting(&token(1, "v1"), "doc-b").unwrap();

        let result = match_tokens(&[token(1, "v1")], &store).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.contains("doc-a"));
        assert!(result.contains("doc-b"));
    }

    #[test]
    fn intersection_within_a_version() {
        let store = MemoryPostingStore::new();
        store.put_posting(&token(1, "v1"), "doc-a").unwrap();
        store.put_posting(&token(1, "v1"), "doc-b").unwrap();
        store.put_posting(&token(2, "v1"), "doc-b").unwrap();
        store.put_posting(&token(2, "v1"), "doc-c").unwrap();

        let result = match_tokens(&[token(1, "v1"), token(2, "v1")], &store).unwrap();
        assert_eq!(result, BTreeSet::from(["doc-b".to_string()]));
    }

    #[test]
    fn empty_posting_list_short_circuits_to_empty() {
        let store = MemoryPostingStore::new();
        store.put_posting(&token(1, "v1"), "doc-a").unwrap();

        let result = match_tokens(&[token(1, "v1"), token(9, "v1")], &store).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn union_across_versions() {
        let store = MemoryPostingStore::new();
        // Same term under two key versions hashes to different tokens.
        store.put_posting(&token(1, "v1"), "old-doc").unwrap();
        store.put_posting(&token(2, "v2"), "new-doc").unwrap();

        let result = match_tokens(&[token(1, "v1"), token(2, "v2")], &store).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.contains("old-doc"));
        assert!(result.contains("new-doc"));
    }

    #[test]
    fn one_empty_version_does_not_suppress_another() {
        let store = MemoryPostingStore::new();
        store.put_posting(&token(1, "v1"), "doc-a").unwrap();

        // v2 tokens match nothing; v1 result must survive.
        let result = match_tokens(&[token(1, "v1"), token(9, "v2")], &store).unwrap();
        assert_eq!(result, BTreeSet::from(["doc-a".to_string()]));
    }

    #[test]
    fn empty_query_is_empty_result() {
        let store = MemoryPostingStore::new();
        assert!(match_tokens(&[], &store).unwrap().is_empty());
    }

    #[test]
    fn postings_are_additive_sets() {
        let store = MemoryPostingStore::new();
        store.put_posting(&token(1, "v1"), "doc-a").unwrap();
        store.put_posting(&token(1, "v1"), "doc-a").unwrap();
        assert_eq!(store.get_posting(&token(1, "v1")).unwrap().len(), 1);
    }
}
