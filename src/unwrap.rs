//! Session key wrap / unwrap: RSA-OAEP (SHA-256) over a 32-byte AES key.

use core::fmt;

use rand_core::OsRng;
use rsa::Oaep;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::aead::AES_KEY_BYTES;
use crate::error::{IntegrityFailure, Result, VaultError};
use crate::keys::{RecipientPublicKey, UnlockedPrivateKey};

/// One-time AES-256 key for a single message.
#[derive(Clone)]
pub struct SessionKey(Zeroizing<[u8; AES_KEY_BYTES]>);

impl SessionKey {
    /// Fresh random key (sender side).
    pub fn generate() -> Result<Self> {
        let mut key = Zeroizing::new([0u8; AES_KEY_BYTES]);
        getrandom::getrandom(key.as_mut_slice())?;
        Ok(Self(key))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; AES_KEY_BYTES] = bytes.try_into().map_err(|_| {
            VaultError::format(
                "session key",
                format!("expected {} bytes, got {}", AES_KEY_BYTES, bytes.len()),
            )
        })?;
        Ok(Self(Zeroizing::new(arr)))
    }

    pub fn as_bytes(&self) -> &[u8; AES_KEY_BYTES] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

/// Recover the raw session key. No retry: any failure means this message
/// cannot be read with this private key.
pub fn unwrap_session_key(key: &UnlockedPrivateKey, wrapped: &[u8]) -> Result<SessionKey> {
    let raw = key
        .rsa()
        .decrypt(Oaep::new::<Sha256>(), wrapped)
        .map(Zeroizing::new)
        .map_err(|_| VaultError::Integrity(IntegrityFailure::KeyUnwrap))?;
    SessionKey::from_bytes(&raw)
}

/// Wrap a session key to the receiver's public key (sender side).
pub fn wrap_session_key(recipient: &RecipientPublicKey, session_key: &SessionKey) -> Result<Vec<u8>> {
    recipient
        .rsa()
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), session_key.as_bytes())
        .map_err(|e| VaultError::Backend(format!("RSA-OAEP encrypt: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_requires_32() {
        assert!(SessionKey::from_bytes(&[0u8; 32]).is_ok());
        assert!(matches!(
            SessionKey::from_bytes(&[0u8; 16]),
            Err(VaultError::Format { what: "session key", .. })
        ));
    }

    #[test]
    fn generated_keys_differ_and_are_redacted() {
        let a = SessionKey::generate().unwrap();
        let b = SessionKey::generate().unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_eq!(format!("{:?}", a), "SessionKey(<redacted>)");
    }
}
