//! Per-login session context.
//!
//! A [`Session`] is created at login from the user's sealed envelope, is
//! passed explicitly to everything that needs the private key, and is
//! consumed by [`Session::logout`]. Dropping it drops the vault and with it
//! the only copy of the unlocked key.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::aad::Aad;
use crate::envelope::KeyEnvelope;
use crate::error::{Result, VaultError};
use crate::keys::{RecipientPublicKey, UnlockedPrivateKey};
use crate::message::{EncryptedMessage, MessageMetadata};
use crate::payload::{decrypt_payload, encrypt_payload};
use crate::store::EnvelopeStore;
use crate::unwrap::{unwrap_session_key, wrap_session_key, SessionKey};
use crate::vault::{PrivateKeyVault, VaultStatus};

/// Per-message result of a batch open.
#[derive(Debug)]
pub enum MessageOutcome {
    Decrypted(String),
    /// Shown as "cannot decrypt"; never as partial plaintext.
    Undecryptable(VaultError),
}

impl MessageOutcome {
    pub fn plaintext(&self) -> Option<&str> {
        match self {
            Self::Decrypted(text) => Some(text),
            Self::Undecryptable(_) => None,
        }
    }
}

/// Unwrap the session key, then decrypt the payload under the message AAD.
pub fn open_with_key(key: &UnlockedPrivateKey, message: &EncryptedMessage) -> Result<String> {
    let session_key = unwrap_session_key(key, &message.wrapped_session_key)?;
    decrypt_payload(&session_key, &message.encrypted_payload, &message.aad())
}

async fn open_blocking(key: Arc<UnlockedPrivateKey>, message: EncryptedMessage) -> Result<String> {
    tokio::task::spawn_blocking(move || open_with_key(&key, &message)).await?
}

pub struct Session {
    user_id: String,
    vault: PrivateKeyVault,
}

impl Session {
    pub fn login(user_id: impl Into<String>, envelope: KeyEnvelope) -> Self {
        let user_id = user_id.into();
        tracing::debug!(user = %user_id, "session started");
        Self {
            user_id,
            vault: PrivateKeyVault::new(envelope),
        }
    }

    /// Log in with whatever envelope the store holds for `user_id`.
    /// A user without one gets a session whose unlock reports `Unavailable`.
    pub fn login_from_store(user_id: impl Into<String>, store: &dyn EnvelopeStore) -> Result<Self> {
        let user_id = user_id.into();
        let vault = match store.get(&user_id)? {
            Some(envelope) => PrivateKeyVault::new(envelope),
            None => PrivateKeyVault::empty(),
        };
        Ok(Self { user_id, vault })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn vault(&self) -> &PrivateKeyVault {
        &self.vault
    }

    pub async fn status(&self) -> VaultStatus {
        self.vault.status().await
    }

    pub async fn unlock(&self, passphrase: &str) -> Result<Arc<UnlockedPrivateKey>> {
        self.vault.unlock(passphrase).await
    }

    /// Decrypt one message. Unwrap strictly precedes payload decryption.
    pub async fn open(&self, message: &EncryptedMessage) -> Result<String> {
        let key = self.vault.private_key().await?;
        open_blocking(key, message.clone()).await
    }

    /// Decrypt a batch. Each message succeeds or is marked undecryptable on
    /// its own; one bad message never hides the others.
    ///
    /// A vault without an unlocked key fails the whole batch with
    /// `Unavailable` instead of marking every message.
    pub async fn open_all(&self, messages: &[EncryptedMessage]) -> Result<Vec<MessageOutcome>> {
        self.open_batch(messages.iter().cloned().map(Ok).collect()).await
    }

    /// Like [`Session::open_all`], for a batch whose entries were validated
    /// one by one (see [`crate::message::parse_message_batch`]). Entries that
    /// failed validation come back as `Undecryptable` in their position.
    pub async fn open_batch(&self, entries: Vec<Result<EncryptedMessage>>) -> Result<Vec<MessageOutcome>> {
        let key = self.vault.private_key().await?;
        let mut outcomes = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let (route, result) = match entry {
                Ok(message) => {
                    let route = format!("{}->{}", message.sender_id, message.receiver_id);
                    (route, open_blocking(Arc::clone(&key), message).await)
                }
                Err(e) => (String::from("(invalid)"), Err(e)),
            };
            let outcome = match result {
                Ok(text) => MessageOutcome::Decrypted(text),
                Err(e) => {
                    tracing::warn!(index, route = %route, error = %e, "message undecryptable");
                    MessageOutcome::Undecryptable(e)
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Encrypt `plaintext` from this user to `receiver_id`.
    pub async fn compose(
        &self,
        receiver_id: &str,
        receiver_key: &RecipientPublicKey,
        plaintext: &str,
        metadata: MessageMetadata,
    ) -> Result<EncryptedMessage> {
        compose_message(&self.user_id, receiver_id, receiver_key, plaintext, metadata).await
    }

    /// End the session; the unlocked key is dropped with it.
    pub fn logout(self) {
        tracing::debug!(user = %self.user_id, "session ended");
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("vault", &self.vault)
            .finish()
    }
}

/// Sender side of the pipeline: fresh session key, wrap, seal.
pub async fn compose_message(
    sender_id: &str,
    receiver_id: &str,
    receiver_key: &RecipientPublicKey,
    plaintext: &str,
    metadata: MessageMetadata,
) -> Result<EncryptedMessage> {
    let sender_id = sender_id.to_string();
    let receiver_id = receiver_id.to_string();
    let receiver_key = receiver_key.clone();
    let plaintext = Zeroizing::new(plaintext.to_string());
    tokio::task::spawn_blocking(move || -> Result<EncryptedMessage> {
        let session_key = SessionKey::generate()?;
        let wrapped_session_key = wrap_session_key(&receiver_key, &session_key)?;
        let aad = Aad::for_message(&sender_id, &receiver_id);
        let encrypted_payload = encrypt_payload(&session_key, &plaintext, &aad)?;
        Ok(EncryptedMessage {
            sender_id,
            receiver_id,
            wrapped_session_key,
            encrypted_payload,
            metadata,
        })
    })
    .await?
}
