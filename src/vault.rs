//! Private key vault: a passphrase-sealed PEM private key and its one-time
//! unlock into an in-memory RSA handle.
//!
//! ```text
//! Locked --unlock(pw)--> Unlocking --AEAD ok--> Unlocked
//!                            │
//!                            ├─ tag mismatch with AAD ──> retry once without AAD
//!                            └─ anything else, or retry fails ──> previous state + error
//! ```
//!
//! An unlock whose future is dropped before it finishes counts as failed.
//!
//! The retry exists for envelopes sealed before AAD binding was introduced.
//! It runs only on `Integrity(AeadVerification)`; malformed input
//! (bad IV/tag length, bad PEM) is never retried.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use zeroize::Zeroizing;

use crate::aad::Aad;
use crate::aead::{self, aead_open, aead_seal};
use crate::envelope::{KeyEnvelope, WireEnvelope, VAULT_ALGORITHM};
use crate::error::{Result, VaultError};
use crate::kdf::{self, derive_key_blocking, DerivedKey};
use crate::keys::{import_private_key_blocking, UnlockedPrivateKey};

/// Externally visible vault state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VaultStatus {
    /// No usable key (either no envelope or never unlocked).
    Locked,
    /// An unlock is in flight.
    Unlocking,
    /// A private key is cached for the session.
    Unlocked,
}

/// Marks one unlock as in flight until it returns or its future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Result of one AES-GCM attempt during unlock.
pub enum OpenOutcome {
    Opened(Zeroizing<Vec<u8>>),
    /// Tag did not verify under the vault AAD; the envelope may predate AAD binding.
    RetryWithoutAad,
    Fatal(VaultError),
}

impl OpenOutcome {
    /// Classify the AAD-bound attempt.
    pub fn from_bound_attempt(result: Result<Zeroizing<Vec<u8>>>) -> Self {
        match result {
            Ok(pt) => Self::Opened(pt),
            Err(e) if e.is_aead_verification() => Self::RetryWithoutAad,
            Err(e) => Self::Fatal(e),
        }
    }
}

/// Decrypt the envelope's PEM plaintext with an already-derived key.
///
/// Exactly one retry without AAD, and only after a tag mismatch.
pub fn open_private_key_envelope(key: &DerivedKey, envelope: &KeyEnvelope) -> Result<Zeroizing<Vec<u8>>> {
    let sealed = envelope.sealed_ciphertext()?;
    let bound = aead_open(key, envelope.iv(), &sealed, Some(Aad::for_vault().as_bytes()));
    match OpenOutcome::from_bound_attempt(bound) {
        OpenOutcome::Opened(pt) => Ok(pt),
        OpenOutcome::Fatal(e) => Err(e),
        OpenOutcome::RetryWithoutAad => {
            let pt = aead_open(key, envelope.iv(), &sealed, None)?;
            tracing::warn!("private key envelope has no AAD binding; reseal it");
            Ok(pt)
        }
    }
}

/// Seal PEM private-key text under a passphrase (registration / rotation).
pub async fn seal_private_key(passphrase: &str, pem: &str) -> Result<KeyEnvelope> {
    let salt = kdf::generate_salt()?;
    let iv = aead::nonce()?;
    let key = derive_key_blocking(passphrase, &salt).await?;
    let sealed = aead_seal(&key, &iv, pem.as_bytes(), Some(Aad::for_vault().as_bytes()))?;
    Ok(KeyEnvelope::from_sealed(VAULT_ALGORITHM, &iv, &salt, sealed))
}

/// Holds one encrypted private key and at most one unlocked handle.
///
/// The cached handle only changes when an unlock completes successfully.
/// A failed unlock, or one whose future is dropped (timeout, cancellation),
/// leaves it exactly as it was.
pub struct PrivateKeyVault {
    envelope: Option<KeyEnvelope>,
    cached: Mutex<Option<Arc<UnlockedPrivateKey>>>,
    in_flight: AtomicUsize,
}

impl PrivateKeyVault {
    pub fn new(envelope: KeyEnvelope) -> Self {
        Self::with_envelope(Some(envelope))
    }

    /// A vault with nothing to unlock (user has no key registered yet).
    pub fn empty() -> Self {
        Self::with_envelope(None)
    }

    fn with_envelope(envelope: Option<KeyEnvelope>) -> Self {
        Self {
            envelope,
            cached: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Validate a wire envelope at the boundary and wrap it.
    pub fn from_wire(wire: &WireEnvelope) -> Result<Self> {
        KeyEnvelope::from_wire(wire).map(Self::new)
    }

    pub fn envelope(&self) -> Option<&KeyEnvelope> {
        self.envelope.as_ref()
    }

    pub async fn status(&self) -> VaultStatus {
        let cached = self.cached.lock().await;
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            VaultStatus::Unlocking
        } else if cached.is_some() {
            VaultStatus::Unlocked
        } else {
            VaultStatus::Locked
        }
    }

    /// The cached private key. While a re-unlock is in flight the
    /// previously cached key stays usable.
    pub async fn private_key(&self) -> Result<Arc<UnlockedPrivateKey>> {
        self.cached
            .lock()
            .await
            .clone()
            .ok_or(VaultError::Unavailable("unlocked private key"))
    }

    /// Derive, decrypt, import. On success the new handle replaces any
    /// cached one; on failure the cached handle is left untouched.
    pub async fn unlock(&self, passphrase: &str) -> Result<Arc<UnlockedPrivateKey>> {
        let envelope = self
            .envelope
            .as_ref()
            .ok_or(VaultError::Unavailable("private key envelope"))?;

        let _in_flight = InFlight::enter(&self.in_flight);
        tracing::debug!(algorithm = ?envelope.algorithm(), "unlocking private key");

        match Self::unlock_envelope(envelope, passphrase).await {
            Ok(key) => {
                let key = Arc::new(key);
                let previous = self.cached.lock().await.replace(Arc::clone(&key));
                tracing::info!(replaced = previous.is_some(), "private key unlocked");
                Ok(key)
            }
            Err(e) => {
                tracing::warn!(error = %e, "private key unlock failed");
                Err(e)
            }
        }
    }

    async fn unlock_envelope(envelope: &KeyEnvelope, passphrase: &str) -> Result<UnlockedPrivateKey> {
        let key = derive_key_blocking(passphrase, envelope.salt()).await?;
        let envelope = envelope.clone();
        let plaintext =
            tokio::task::spawn_blocking(move || open_private_key_envelope(&key, &envelope)).await??;
        let pem = String::from_utf8(plaintext.to_vec())
            .map(Zeroizing::new)
            .map_err(|e| VaultError::format("private key PEM", e.utf8_error()))?;
        import_private_key_blocking(pem).await
    }
}

impl core::fmt::Debug for PrivateKeyVault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrivateKeyVault")
            .field("envelope", &self.envelope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntegrityFailure;

    fn sealed_with(aad: Option<&[u8]>, key: &DerivedKey, pt: &[u8]) -> KeyEnvelope {
        let iv = [9u8; 12];
        let s = aead_seal(key, &iv, pt, aad).unwrap();
        KeyEnvelope::from_sealed("test", &iv, b"salt", s)
    }

    #[test]
    fn classify_only_retries_tag_mismatch() {
        let ok = OpenOutcome::from_bound_attempt(Ok(Zeroizing::new(vec![1])));
        assert!(matches!(ok, OpenOutcome::Opened(_)));

        let tag = OpenOutcome::from_bound_attempt(Err(VaultError::Integrity(IntegrityFailure::AeadVerification)));
        assert!(matches!(tag, OpenOutcome::RetryWithoutAad));

        let unwrap = OpenOutcome::from_bound_attempt(Err(VaultError::Integrity(IntegrityFailure::KeyUnwrap)));
        assert!(matches!(unwrap, OpenOutcome::Fatal(_)));

        let fmt = OpenOutcome::from_bound_attempt(Err(VaultError::format("iv", "short")));
        assert!(matches!(fmt, OpenOutcome::Fatal(VaultError::Format { .. })));
    }

    #[test]
    fn bound_and_legacy_envelopes_both_open() {
        let key: DerivedKey = Zeroizing::new([5u8; 32]);
        let bound = sealed_with(Some(b"universe-code-key"), &key, b"pem");
        let legacy = sealed_with(None, &key, b"pem");
        assert_eq!(&open_private_key_envelope(&key, &bound).unwrap()[..], b"pem");
        assert_eq!(&open_private_key_envelope(&key, &legacy).unwrap()[..], b"pem");
    }

    #[test]
    fn foreign_aad_is_not_rescued_by_fallback() {
        let key: DerivedKey = Zeroizing::new([5u8; 32]);
        let other = sealed_with(Some(b"alice->bob"), &key, b"pem");
        assert!(open_private_key_envelope(&key, &other).unwrap_err().is_aead_verification());
    }

    #[test]
    fn malformed_iv_fails_without_retry() {
        let key: DerivedKey = Zeroizing::new([5u8; 32]);
        let good = sealed_with(None, &key, b"pem");
        let bad = KeyEnvelope::new(None, vec![0u8; 8], good.salt().to_vec(), good.tag().to_vec(), good.payload().to_vec());
        assert!(matches!(
            open_private_key_envelope(&key, &bad),
            Err(VaultError::Format { what: "iv", .. })
        ));
    }

    #[tokio::test]
    async fn empty_vault_is_unavailable() {
        let vault = PrivateKeyVault::empty();
        assert!(matches!(vault.unlock("pw").await, Err(VaultError::Unavailable(_))));
        assert!(matches!(vault.private_key().await, Err(VaultError::Unavailable(_))));
        assert_eq!(vault.status().await, VaultStatus::Locked);
    }

    #[tokio::test]
    async fn wrong_passphrase_leaves_vault_locked() {
        let env = seal_private_key("right", "not really a pem").await.unwrap();
        let vault = PrivateKeyVault::new(env);
        let err = vault.unlock("wrong").await.unwrap_err();
        assert!(err.is_aead_verification());
        assert_eq!(vault.status().await, VaultStatus::Locked);
    }

    #[tokio::test]
    async fn non_pem_plaintext_is_format_error() {
        let env = seal_private_key("right", "not really a pem").await.unwrap();
        let vault = PrivateKeyVault::new(env);
        assert!(matches!(vault.unlock("right").await, Err(VaultError::Format { .. })));
        assert_eq!(vault.status().await, VaultStatus::Locked);
    }
}
