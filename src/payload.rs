//! Message payload encryption under a session key.
//!
//! The AAD is mandatory here and there is no fallback: a payload opens only
//! under the exact `{sender}->{receiver}` string it was sealed with.

use crate::aad::Aad;
use crate::aead::{self, aead_open, aead_seal};
use crate::envelope::{KeyEnvelope, PAYLOAD_ALGORITHM};
use crate::error::{Result, VaultError};
use crate::kdf::generate_salt;
use crate::unwrap::SessionKey;

pub fn decrypt_payload(session_key: &SessionKey, envelope: &KeyEnvelope, aad: &Aad) -> Result<String> {
    let sealed = envelope.sealed_ciphertext()?;
    let plaintext = aead_open(session_key.as_bytes(), envelope.iv(), &sealed, Some(aad.as_bytes()))?;
    String::from_utf8(plaintext.to_vec()).map_err(|e| VaultError::format("plaintext", e.utf8_error()))
}

/// Seal `plaintext` with a fresh IV.
///
/// The salt is random filler: payload keys are not passphrase-derived, but
/// the record keeps the four-field envelope shape receivers validate.
pub fn encrypt_payload(session_key: &SessionKey, plaintext: &str, aad: &Aad) -> Result<KeyEnvelope> {
    let iv = aead::nonce()?;
    let salt = generate_salt()?;
    let sealed = aead_seal(session_key.as_bytes(), &iv, plaintext.as_bytes(), Some(aad.as_bytes()))?;
    Ok(KeyEnvelope::from_sealed(PAYLOAD_ALGORITHM, &iv, &salt, sealed))
}
