//! Key envelope: ciphertext plus the metadata needed to decrypt it.
//!
//! Wire / storage shape (JSON, base64url strings):
//!
//! ```text
//! { "algorithm": "...",   // optional, informational, never parsed
//!   "iv":        "...",   // 12 bytes
//!   "salt":      "...",   // PBKDF2 salt (random filler for message payloads)
//!   "tag":       "...",   // 16-byte AES-GCM tag
//!   "payload":   "..." }  // ciphertext without the tag
//! ```
//!
//! [`WireEnvelope`] is what arrives from storage or the server; it is
//! converted into a [`KeyEnvelope`] exactly once, at the boundary, and the
//! typed record is what every decrypt path takes.

use serde::{Deserialize, Serialize};

use crate::aead::{self, Sealed};
use crate::codec::{concat, decode_base64_url, encode_base64_url};
use crate::error::{Result, VaultError};

/// Algorithm label written by this crate when sealing a private key.
pub const VAULT_ALGORITHM: &str = "PBKDF2-SHA512/AES-256-GCM";

/// Algorithm label written by this crate when sealing a message payload.
pub const PAYLOAD_ALGORITHM: &str = "AES-256-GCM";

/// Untrusted envelope exactly as serialized. Every field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub iv: Option<String>,
    #[serde(default)]
    pub salt: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
}

/// Validated envelope. All four binary fields are present (possibly empty).
#[derive(Clone, PartialEq, Eq)]
pub struct KeyEnvelope {
    algorithm: Option<String>,
    iv: Vec<u8>,
    salt: Vec<u8>,
    tag: Vec<u8>,
    payload: Vec<u8>,
}

impl KeyEnvelope {
    /// Build from already-decoded parts.
    pub fn new(
        algorithm: Option<String>,
        iv: Vec<u8>,
        salt: Vec<u8>,
        tag: Vec<u8>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            algorithm,
            iv,
            salt,
            tag,
            payload,
        }
    }

    pub(crate) fn from_sealed(algorithm: &str, iv: &[u8], salt: &[u8], sealed: Sealed) -> Self {
        Self::new(
            Some(algorithm.to_string()),
            iv.to_vec(),
            salt.to_vec(),
            sealed.tag,
            sealed.payload,
        )
    }

    /// Validate and decode a wire envelope.
    ///
    /// Missing fields are all reported at once, in `iv, salt, tag, payload`
    /// order. Present-but-empty fields are accepted here and fail later at
    /// decryption.
    pub fn from_wire(wire: &WireEnvelope) -> Result<Self> {
        let fields = [
            ("iv", &wire.iv),
            ("salt", &wire.salt),
            ("tag", &wire.tag),
            ("payload", &wire.payload),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(VaultError::Validation { missing });
        }

        let decode = |v: &Option<String>| decode_base64_url(v.as_deref().unwrap_or_default());
        Ok(Self {
            algorithm: wire.algorithm.clone(),
            iv: decode(&wire.iv)?,
            salt: decode(&wire.salt)?,
            tag: decode(&wire.tag)?,
            payload: decode(&wire.payload)?,
        })
    }

    pub fn to_wire(&self) -> WireEnvelope {
        WireEnvelope {
            algorithm: self.algorithm.clone(),
            iv: Some(encode_base64_url(&self.iv)),
            salt: Some(encode_base64_url(&self.salt)),
            tag: Some(encode_base64_url(&self.tag)),
            payload: Some(encode_base64_url(&self.payload)),
        }
    }

    /// Parse + validate a JSON envelope.
    pub fn from_json(json: &str) -> Result<Self> {
        let wire: WireEnvelope =
            serde_json::from_str(json).map_err(|e| VaultError::format("envelope JSON", e))?;
        Self::from_wire(&wire)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_wire())
            .map_err(|e| VaultError::format("envelope JSON", e))
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// `payload ‖ tag`, the single buffer AES-GCM decrypt expects.
    ///
    /// Rejects an IV or tag of the wrong length so a malformed envelope
    /// never reaches the cipher (and is never mistaken for a tag mismatch).
    pub fn sealed_ciphertext(&self) -> Result<Vec<u8>> {
        aead::check_lengths(&self.iv, &self.tag)?;
        Ok(concat(&self.payload, &self.tag))
    }
}

impl core::fmt::Debug for KeyEnvelope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyEnvelope")
            .field("algorithm", &self.algorithm)
            .field("iv_bytes", &self.iv.len())
            .field("salt_bytes", &self.salt.len())
            .field("tag_bytes", &self.tag.len())
            .field("payload_bytes", &self.payload.len())
            .finish()
    }
}

/// Envelope metadata, extracted without decrypting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub algorithm: Option<String>,
    pub iv_bytes: usize,
    pub salt_bytes: usize,
    pub tag_bytes: usize,
    pub payload_bytes: usize,
    /// IV and tag lengths fit AES-256-GCM.
    pub well_formed: bool,
}

impl core::fmt::Display for EnvelopeInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} | iv {}B | salt {}B | tag {}B | payload {}B{}",
            self.algorithm.as_deref().unwrap_or("(unlabelled)"),
            self.iv_bytes,
            self.salt_bytes,
            self.tag_bytes,
            self.payload_bytes,
            if self.well_formed { "" } else { " | MALFORMED" }
        )
    }
}

/// Inspect envelope metadata without decrypting. Reveals no secrets.
pub fn inspect(envelope: &KeyEnvelope) -> EnvelopeInfo {
    EnvelopeInfo {
        algorithm: envelope.algorithm.clone(),
        iv_bytes: envelope.iv.len(),
        salt_bytes: envelope.salt.len(),
        tag_bytes: envelope.tag.len(),
        payload_bytes: envelope.payload.len(),
        well_formed: aead::check_lengths(&envelope.iv, &envelope.tag).is_ok(),
    }
}
