//! AAD conventions (locked).
//!
//! Vault (private key at rest):
//!   b"universe-code-key"
//!
//! Message payload:
//!   sender_id || b"->" || receiver_id
//!
//! Neither value is encrypted. Both are bound into the AES-GCM tag, so a
//! payload cannot be presented as coming from a different sender/receiver
//! pair and a vault envelope cannot be swapped for a message payload.

use core::fmt;

/// Fixed AAD bound to every private-key envelope sealed by this crate.
pub const VAULT_AAD: &[u8] = b"universe-code-key";

/// Separator between sender and receiver in the message AAD.
pub const MESSAGE_AAD_SEPARATOR: &str = "->";

/// Additional Authenticated Data: bound to ciphertext but not encrypted.
#[derive(Clone, PartialEq, Eq)]
pub struct Aad {
    inner: Vec<u8>,
}

impl Aad {
    /// Raw AAD from arbitrary bytes.
    ///
    /// Prefer the typed constructors when possible.
    pub fn raw(bytes: &[u8]) -> Self {
        Self {
            inner: bytes.to_vec(),
        }
    }

    /// AAD for private-key envelopes.
    pub fn for_vault() -> Self {
        Self::raw(VAULT_AAD)
    }

    /// AAD for a message payload.
    ///
    /// Format: `{sender_id}->{receiver_id}`
    pub fn for_message(sender_id: &str, receiver_id: &str) -> Self {
        Self {
            inner: format!("{}{}{}", sender_id, MESSAGE_AAD_SEPARATOR, receiver_id).into_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }
}

impl fmt::Debug for Aad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aad({:?})", String::from_utf8_lossy(&self.inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_aad_is_arrow_joined() {
        assert_eq!(Aad::for_message("alice", "bob").as_bytes(), b"alice->bob");
        assert_eq!(Aad::for_message("", "").as_bytes(), b"->");
    }

    #[test]
    fn message_aad_is_directional() {
        assert_ne!(Aad::for_message("a", "b"), Aad::for_message("b", "a"));
    }

    #[test]
    fn vault_aad_is_the_fixed_literal() {
        assert_eq!(Aad::for_vault().as_bytes(), b"universe-code-key");
    }
}
