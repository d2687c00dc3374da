//! Known-answer tests against vectors produced by an independent
//! PBKDF2 / AES-GCM / RSA-OAEP implementation.

mod common;

use common::*;
use universe_vault::error::IntegrityFailure;
use universe_vault::{
    decrypt_payload, derive_key, unwrap_session_key, PrivateKeyVault, VaultError, VaultStatus,
    PBKDF2_ITERATIONS,
};

const SALT_HEX: &str = "000102030405060708090a0b0c0d0e0f";
const IV_HEX: &str = "a0a1a2a3a4a5a6a7a8a9aaab";
const DERIVED_KEY_HEX: &str = "59c89cc376b1a0a4878a731b4ff1b5e982ab1c39bea65cbed67d867f3ec576b5";
const SESSION_KEY_HEX: &str = "202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f";

#[test]
fn test_parameters() {
    assert_eq!(PBKDF2_ITERATIONS, 150_000);
    let env = scenario_a_envelope();
    assert_eq!(hex::encode(env.salt()), SALT_HEX);
    assert_eq!(hex::encode(env.iv()), IV_HEX);
    assert_eq!(env.tag().len(), 16);
    assert_eq!(env.algorithm(), Some("PBKDF2-SHA512/AES-256-GCM"));
}

#[test]
fn test_pbkdf2_output() {
    let salt = hex::decode(SALT_HEX).unwrap();
    let key = derive_key(PASSPHRASE, &salt);
    assert_eq!(hex::encode(&key[..]), DERIVED_KEY_HEX);
}

#[tokio::test]
async fn scenario_a_correct_passphrase_returns_exact_pem() {
    let vault = PrivateKeyVault::new(scenario_a_envelope());
    let key = vault.unlock(PASSPHRASE).await.unwrap();
    assert_eq!(key.pem(), ALICE_PEM);
    assert_eq!(vault.status().await, VaultStatus::Unlocked);
}

#[tokio::test]
async fn scenario_a_wrong_passphrase_is_integrity_error() {
    let vault = PrivateKeyVault::new(scenario_a_envelope());
    let err = vault.unlock("correct horse battery stapler").await.unwrap_err();
    assert!(matches!(err, VaultError::Integrity(IntegrityFailure::AeadVerification)), "{err:?}");
    assert_eq!(vault.status().await, VaultStatus::Locked);
}

#[tokio::test]
async fn scenario_a_legacy_envelope_unlocks() {
    let vault = PrivateKeyVault::new(scenario_a_legacy_envelope());
    assert_eq!(vault.envelope().unwrap().algorithm(), None);
    let key = vault.unlock(PASSPHRASE).await.unwrap();
    assert_eq!(key.pem(), ALICE_PEM);
}

#[test]
fn scenario_b_unwrap_returns_exact_session_key() {
    let msg = scenario_b_message();
    let session_key = unwrap_session_key(&ALICE, &msg.wrapped_session_key).unwrap();
    assert_eq!(hex::encode(session_key.as_bytes()), SESSION_KEY_HEX);

    let text = decrypt_payload(&session_key, &msg.encrypted_payload, &msg.aad()).unwrap();
    assert_eq!(text, "hello from bob");
}

#[test]
fn scenario_b_other_private_key_fails() {
    let msg = scenario_b_message();
    let err = unwrap_session_key(&BOB, &msg.wrapped_session_key).unwrap_err();
    assert!(matches!(err, VaultError::Integrity(IntegrityFailure::KeyUnwrap)));
}

#[test]
fn scenario_b_metadata_is_carried() {
    let msg = scenario_b_message();
    assert_eq!(msg.sender_id, "bob");
    assert_eq!(msg.receiver_id, "alice");
    assert_eq!(msg.metadata.sentiment.as_deref(), Some("joy"));
    assert_eq!(
        msg.metadata.sent_at.map(|t| t.to_rfc3339()),
        Some("2026-03-14T15:09:26+00:00".to_string())
    );
}
