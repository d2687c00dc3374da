#![allow(dead_code)]

use once_cell::sync::Lazy;
use universe_vault::{import_private_key, EncryptedMessage, KeyEnvelope, UnlockedPrivateKey};

pub const PASSPHRASE: &str = "correct horse battery staple";

pub const ALICE_PEM: &str = include_str!("../data/alice_private.pem");
pub const BOB_PEM: &str = include_str!("../data/bob_private.pem");

pub static ALICE: Lazy<UnlockedPrivateKey> = Lazy::new(|| import_private_key(ALICE_PEM).unwrap());
pub static BOB: Lazy<UnlockedPrivateKey> = Lazy::new(|| import_private_key(BOB_PEM).unwrap());

/// Alice's PEM sealed under `PASSPHRASE` with the vault AAD.
pub fn scenario_a_envelope() -> KeyEnvelope {
    KeyEnvelope::from_json(include_str!("../data/scenario_a_envelope.json")).unwrap()
}

/// Same key and parameters, sealed before AAD binding existed.
pub fn scenario_a_legacy_envelope() -> KeyEnvelope {
    KeyEnvelope::from_json(include_str!("../data/scenario_a_legacy_envelope.json")).unwrap()
}

/// bob -> alice, "hello from bob", session key wrapped for alice.
pub fn scenario_b_message() -> EncryptedMessage {
    EncryptedMessage::from_json(include_str!("../data/scenario_b_message.json")).unwrap()
}
