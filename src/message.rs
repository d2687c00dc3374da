//! Encrypted message as delivered by the server.
//!
//! Only `encrypted_payload` is authenticated, and only under the
//! `{sender_id}->{receiver_id}` AAD. `sentiment` and `sent_at` ride along
//! unauthenticated and must never be trusted for anything security relevant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aad::Aad;
use crate::codec::{decode_base64_url, encode_base64_url};
use crate::envelope::{KeyEnvelope, WireEnvelope};
use crate::error::{Result, VaultError};

/// Descriptive, unauthenticated metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

/// Message exactly as serialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub sender_id: String,
    pub receiver_id: String,
    /// base64url RSA-OAEP ciphertext
    pub wrapped_session_key: String,
    pub encrypted_payload: WireEnvelope,
    #[serde(flatten)]
    pub metadata: MessageMetadata,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub wrapped_session_key: Vec<u8>,
    pub encrypted_payload: KeyEnvelope,
    pub metadata: MessageMetadata,
}

impl EncryptedMessage {
    pub fn from_wire(wire: &WireMessage) -> Result<Self> {
        Ok(Self {
            sender_id: wire.sender_id.clone(),
            receiver_id: wire.receiver_id.clone(),
            wrapped_session_key: decode_base64_url(&wire.wrapped_session_key)?,
            encrypted_payload: KeyEnvelope::from_wire(&wire.encrypted_payload)?,
            metadata: wire.metadata.clone(),
        })
    }

    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            sender_id: self.sender_id.clone(),
            receiver_id: self.receiver_id.clone(),
            wrapped_session_key: encode_base64_url(&self.wrapped_session_key),
            encrypted_payload: self.encrypted_payload.to_wire(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let wire: WireMessage =
            serde_json::from_str(json).map_err(|e| VaultError::format("message JSON", e))?;
        Self::from_wire(&wire)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_wire())
            .map_err(|e| VaultError::format("message JSON", e))
    }

    /// AAD the payload must have been sealed under.
    pub fn aad(&self) -> Aad {
        Aad::for_message(&self.sender_id, &self.receiver_id)
    }
}

/// Parse a message file: one message object or an array of them.
///
/// Only input that is not JSON at all fails as a whole. Every element is
/// validated on its own, so one malformed message yields an `Err` in its
/// slot and leaves the others usable.
pub fn parse_message_batch(json: &str) -> Result<Vec<Result<EncryptedMessage>>> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| VaultError::format("message JSON", e))?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        single => vec![single],
    };
    Ok(items
        .into_iter()
        .map(|item| {
            let wire: WireMessage =
                serde_json::from_value(item).map_err(|e| VaultError::format("message JSON", e))?;
            EncryptedMessage::from_wire(&wire)
        })
        .collect())
}
