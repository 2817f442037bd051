//! Full client-side flow: key hierarchy → encrypt → index → rotate →
//! cross-version search → version-routed decrypt.

use std::collections::BTreeSet;

use serde_json::json;

use neurallog_crypto::{
    decrypt_log_data, decrypt_log_name, derive_master_kek, derive_master_secret,
    derive_master_secret_default, derive_search_key, encode_log_entry, encrypt_log_data,
    encrypt_log_name, extract_terms, generate_tokens, CryptoError, OperationalKek,
    MIN_PBKDF2_ITERATIONS,
};
use neurallog_kek::{
    index_document, match_tokens, KekRing, KekVersionManager, KekVersionStatus,
    MemoryPostingStore,
};

#[test]
fn acme_scenario() {
    // Tenant bootstrap: recovery phrase → master secret → master KEK.
    let master_secret = derive_master_secret(
        "acme",
        "correct horse battery staple plus a few more words",
        MIN_PBKDF2_ITERATIONS,
    )
    .unwrap();
    let master_kek = derive_master_kek(&master_secret).unwrap();

    let manager = KekVersionManager::new("acme");
    let postings = MemoryPostingStore::new();
    let mut ring = KekRing::new();

    // v1 goes Active; the client derives its operational key.
    let v1 = manager.create_version(0, "initial", "admin").unwrap();
    assert_eq!(v1.id, "v1");
    ring.derive_and_insert(&master_kek, &v1.id).unwrap();

    // First log entry, written under v1.
    let data1 = json!({"level": "ERROR", "message": "db down"});
    let kek_v1 = ring.resolve_kek("v1");
    let name1 = encrypt_log_name("application-logs", &kek_v1).unwrap();
    let artifact1 = encrypt_log_data(&data1, &kek_v1).unwrap();
    assert_eq!(artifact1.kek_version_id, "v1");

    let terms1 = extract_terms(&data1).unwrap();
    assert!(terms1.contains("down"));
    assert!(terms1.contains("error"));
    let tokens1 = generate_tokens(&terms1, &derive_search_key(&kek_v1).unwrap()).unwrap();
    index_document(&tokens1, "doc-1", &postings).unwrap();

    // Quarterly rotation: v2 Active, v1 DecryptOnly.
    let v2 = manager.rotate(manager.revision(), "quarterly", &[], "admin").unwrap();
    assert_eq!(v2.id, "v2");
    assert_eq!(manager.get("v1").unwrap().status, KekVersionStatus::DecryptOnly);
    assert_eq!(manager.active().unwrap().id, "v2");
    ring.derive_and_insert(&master_kek, &v2.id).unwrap();

    // Second log entry, written under v2.
    let data2 = json!({"level": "INFO", "message": "startup complete"});
    let kek_v2 = ring.resolve_kek("v2");
    let artifact2 = encrypt_log_data(&data2, &kek_v2).unwrap();
    assert_eq!(artifact2.kek_version_id, "v2");
    let tokens2 = generate_tokens(
        &extract_terms(&data2).unwrap(),
        &derive_search_key(&kek_v2).unwrap(),
    )
    .unwrap();
    index_document(&tokens2, "doc-2", &postings).unwrap();

    // Query "down" with tokens regenerated under both held versions; only
    // the v1 document matches.
    let query = ring.query_tokens_for_term("down");
    assert_eq!(query.len(), 2);
    let result = match_tokens(&query, &postings).unwrap();
    assert_eq!(result, BTreeSet::from(["doc-1".to_string()]));

    // Both artifacts decrypt through the ring, each routed to its version.
    assert_eq!(decrypt_log_data(&artifact1, &ring).unwrap(), data1);
    assert_eq!(decrypt_log_data(&artifact2, &ring).unwrap(), data2);
    assert_eq!(decrypt_log_name(&name1, &ring).unwrap(), "application-logs");

    // A client holding only v2 cannot read the v1 artifact.
    let mut v2_only = KekRing::new();
    v2_only.derive_and_insert(&master_kek, "v2").unwrap();
    assert!(matches!(
        decrypt_log_data(&artifact1, &v2_only),
        Err(CryptoError::KeyNotAvailable(_))
    ));

    // Forcing the v2 key bytes onto the v1 artifact fails authentication,
    // never yields plaintext.
    let imposter = OperationalKek::from_bytes("v1", *kek_v2.as_bytes());
    assert!(matches!(
        decrypt_log_data(&artifact1, &imposter),
        Err(CryptoError::AuthenticationFailed)
    ));
}

#[test]
fn storage_bound_entry_shape() {
    let master_secret = derive_master_secret_default("acme", "another recovery phrase").unwrap();
    let master_kek = derive_master_kek(&master_secret).unwrap();
    let mut ring = KekRing::new();
    ring.derive_and_insert(&master_kek, "v1").unwrap();
    let kek = ring.resolve_kek("v1");

    let data = json!({"level": "WARN", "message": "disk pressure"});
    let name = encrypt_log_name("infra-logs", &kek).unwrap();
    let artifact = encrypt_log_data(&data, &kek).unwrap();
    let tokens = generate_tokens(
        &extract_terms(&data).unwrap(),
        &derive_search_key(&kek).unwrap(),
    )
    .unwrap();

    let entry = encode_log_entry(&name, &artifact, &tokens);
    let wire = serde_json::to_value(&entry).unwrap();
    assert_eq!(wire["kekVersion"], "v1");
    assert!(wire["encryptedName"].is_string());
    assert!(wire["encryptedData"]["ciphertext"].is_string());
    assert!(wire["encryptedData"]["iv"].is_string());
    assert!(wire["encryptedData"]["tag"].is_string());
    let token_count = wire["searchTokens"].as_array().unwrap().len();
    assert_eq!(token_count, tokens.len());
}

trait RingTestExt {
    fn resolve_kek(&self, version_id: &str) -> OperationalKek;
}

impl RingTestExt for KekRing {
    fn resolve_kek(&self, version_id: &str) -> OperationalKek {
        use neurallog_crypto::KekResolver;
        self.resolve(version_id).expect("version held by ring")
    }
}
