//! # Universe Vault
//!
//! Client-side key vault and message envelope decryption.
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn demo(envelope_json: &str, message_json: &str) -> Result<(), universe_vault::VaultError> {
//! use universe_vault::{EncryptedMessage, KeyEnvelope, Session};
//!
//! let envelope = KeyEnvelope::from_json(envelope_json)?;
//! let session = Session::login("alice", envelope);
//! session.unlock("correct horse battery staple").await?;
//!
//! let message = EncryptedMessage::from_json(message_json)?;
//! let plaintext = session.open(&message).await?;
//! # let _ = plaintext;
//! session.logout();
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! vault.unlock(passphrase)          PBKDF2-SHA512 → AES-256-GCM (AAD "universe-code-key")
//!   → UnlockedPrivateKey            PKCS#8 RSA
//! unwrap(key, wrapped_session_key)  RSA-OAEP / SHA-256
//!   → SessionKey (32 bytes)
//! decrypt(session_key, payload)     AES-256-GCM (AAD "{sender}->{receiver}")
//!   → UTF-8 plaintext
//! ```
//!
//! ## Security Properties
//!
//! - **AAD binding**: a payload opens only for the sender/receiver pair it was sealed for
//! - **One recovery path**: vault unlock retries without AAD only after a tag mismatch
//! - **No partial plaintext**: every failure is an error; batch opens mark messages undecryptable
//! - **Nothing unlocked is persisted**: stores only ever see sealed envelopes
//!
//! ## What's NOT Provided
//!
//! - Key generation
//! - Network transport
//! - Implementations of the primitives themselves (RustCrypto crates are used)

#![deny(unsafe_code)]

pub mod aad;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod message;
pub mod payload;
pub mod session;
pub mod store;
pub mod unwrap;
pub mod vault;

// Primitive wrappers are public for tooling and tests but are not stable API.
#[doc(hidden)]
pub mod aead;

pub use aad::{Aad, VAULT_AAD};
pub use codec::{concat, decode_base64_url, encode_base64_url};
pub use config::{LogFormat, VaultConfig};
pub use envelope::{inspect, EnvelopeInfo, KeyEnvelope, WireEnvelope};
pub use error::{IntegrityFailure, Result, VaultError};
pub use kdf::{derive_key, PBKDF2_ITERATIONS};
pub use keys::{import_private_key, RecipientPublicKey, UnlockedPrivateKey};
pub use message::{parse_message_batch, EncryptedMessage, MessageMetadata, WireMessage};
pub use payload::{decrypt_payload, encrypt_payload};
pub use session::{compose_message, open_with_key, MessageOutcome, Session};
pub use store::{EnvelopeStore, FileEnvelopeStore, InMemoryEnvelopeStore};
pub use unwrap::{unwrap_session_key, wrap_session_key, SessionKey};
pub use vault::{seal_private_key, OpenOutcome, PrivateKeyVault, VaultStatus};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
