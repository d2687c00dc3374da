//! AEAD: AES-256-GCM
//!
//! Envelopes keep `payload` and `tag` apart; the primitive wants one
//! `payload ‖ tag` buffer. IV and tag lengths are checked here, before the
//! cipher runs, so that the cipher's only remaining failure mode is tag
//! verification. That is what lets callers treat
//! `Integrity(AeadVerification)` as "wrong key / wrong AAD / tampered" and
//! nothing else.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use getrandom::getrandom;
use zeroize::Zeroizing;

use crate::error::{IntegrityFailure, Result, VaultError};

pub const NONCE_BYTES: usize = 12;
pub const AEAD_TAG_BYTES: usize = 16;
pub const AES_KEY_BYTES: usize = 32;

/// Output of a seal: ciphertext and tag kept apart, the way envelopes store them.
pub struct Sealed {
    pub payload: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Generate a random 12-byte nonce. Used during encryption only.
pub fn nonce() -> Result<[u8; NONCE_BYTES]> {
    let mut n = [0u8; NONCE_BYTES];
    getrandom(&mut n)?;
    Ok(n)
}

/// AEAD seal (encrypt path). `aad = None` produces a legacy, unbound envelope.
pub fn aead_seal(
    key: &[u8; AES_KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    plaintext: &[u8],
    aad: Option<&[u8]>,
) -> Result<Sealed> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| VaultError::format("AES key", e))?;
    let n = Nonce::from_slice(nonce);
    let payload = Payload {
        msg: plaintext,
        aad: aad.unwrap_or_default(),
    };
    let mut out = cipher
        .encrypt(n, payload)
        .map_err(|_| VaultError::Backend("AES-GCM encrypt".into()))?;
    let tag = out.split_off(out.len() - AEAD_TAG_BYTES);
    Ok(Sealed { payload: out, tag })
}

/// Check that `iv` and `tag` have the lengths AES-256-GCM requires.
pub fn check_lengths(iv: &[u8], tag: &[u8]) -> Result<()> {
    if iv.len() != NONCE_BYTES {
        return Err(VaultError::format(
            "iv",
            format!("expected {} bytes, got {}", NONCE_BYTES, iv.len()),
        ));
    }
    if tag.len() != AEAD_TAG_BYTES {
        return Err(VaultError::format(
            "tag",
            format!("expected {} bytes, got {}", AEAD_TAG_BYTES, tag.len()),
        ));
    }
    Ok(())
}

/// AEAD open (decrypt path).
///
/// `sealed` is `payload ‖ tag`. Length problems surface as `Format`; a
/// tag that does not verify surfaces as `Integrity(AeadVerification)`.
pub fn aead_open(
    key: &[u8; AES_KEY_BYTES],
    iv: &[u8],
    sealed: &[u8],
    aad: Option<&[u8]>,
) -> Result<Zeroizing<Vec<u8>>> {
    if iv.len() != NONCE_BYTES {
        return Err(VaultError::format(
            "iv",
            format!("expected {} bytes, got {}", NONCE_BYTES, iv.len()),
        ));
    }
    if sealed.len() < AEAD_TAG_BYTES {
        return Err(VaultError::format("ciphertext", "shorter than the AEAD tag"));
    }
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| VaultError::format("AES key", e))?;
    let n = Nonce::from_slice(iv);
    let payload = Payload {
        msg: sealed,
        aad: aad.unwrap_or_default(),
    };
    cipher
        .decrypt(n, payload)
        .map(Zeroizing::new)
        .map_err(|_| VaultError::Integrity(IntegrityFailure::AeadVerification))
}
