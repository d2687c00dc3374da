//! Unified error type for the vault and message pipeline.

use core::fmt;

/// Which authenticity check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityFailure {
    /// AES-GCM tag did not verify (wrong key, wrong AAD, tampered bytes).
    AeadVerification,
    /// RSA-OAEP unwrap of a session key failed.
    KeyUnwrap,
}

impl fmt::Display for IntegrityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AeadVerification => write!(f, "AEAD verification failed"),
            Self::KeyUnwrap => write!(f, "session key unwrap failed"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Envelope is missing one or more of `iv`, `salt`, `tag`, `payload`.
    #[error("invalid envelope: missing field(s) {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    /// Nothing to operate on (no envelope loaded, vault not unlocked).
    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("integrity check failed: {0}")]
    Integrity(IntegrityFailure),

    /// Malformed base64url, PEM, key encoding, field length or UTF-8.
    #[error("malformed {what}: {reason}")]
    Format { what: &'static str, reason: String },

    #[error("storage error: {0}")]
    Storage(String),

    /// Blocking pool or randomness source failed.
    #[error("crypto backend failure: {0}")]
    Backend(String),
}

impl VaultError {
    pub(crate) fn format(what: &'static str, reason: impl fmt::Display) -> Self {
        Self::Format {
            what,
            reason: reason.to_string(),
        }
    }

    /// True only for an AES-GCM tag mismatch; the single failure class
    /// the vault is allowed to retry without AAD.
    pub fn is_aead_verification(&self) -> bool {
        matches!(self, Self::Integrity(IntegrityFailure::AeadVerification))
    }
}

impl From<tokio::task::JoinError> for VaultError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Backend(format!("blocking task: {}", e))
    }
}

impl From<getrandom::Error> for VaultError {
    fn from(e: getrandom::Error) -> Self {
        Self::Backend(format!("rng: {}", e))
    }
}

pub type Result<T> = core::result::Result<T, VaultError>;
