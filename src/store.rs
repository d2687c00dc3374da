//! Storage backends for sealed private-key envelopes.
//!
//! Only the encrypted [`KeyEnvelope`] ever reaches a backend. Unlocked
//! handles have no serialization path at all.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::envelope::KeyEnvelope;
use crate::error::{Result, VaultError};

/// Backend for persisting one envelope per user.
///
/// Implement this for your infrastructure:
/// - InMemoryEnvelopeStore (testing)
/// - FileEnvelopeStore (desktop / CLI)
/// - the server's key endpoint (production)
pub trait EnvelopeStore: Send + Sync {
    fn get(&self, user_id: &str) -> Result<Option<KeyEnvelope>>;
    fn put(&self, user_id: &str, envelope: &KeyEnvelope) -> Result<()>;
    fn delete(&self, user_id: &str) -> Result<()>;
    fn list_users(&self) -> Result<Vec<String>>;
}

fn poisoned<T>(_: T) -> VaultError {
    VaultError::Storage("lock poisoned".into())
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// In-memory storage (for testing and ephemeral use).
#[derive(Default)]
pub struct InMemoryEnvelopeStore {
    envelopes: RwLock<HashMap<String, KeyEnvelope>>,
}

impl InMemoryEnvelopeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvelopeStore for InMemoryEnvelopeStore {
    fn get(&self, user_id: &str) -> Result<Option<KeyEnvelope>> {
        let envelopes = self.envelopes.read().map_err(poisoned)?;
        Ok(envelopes.get(user_id).cloned())
    }

    fn put(&self, user_id: &str, envelope: &KeyEnvelope) -> Result<()> {
        let mut envelopes = self.envelopes.write().map_err(poisoned)?;
        envelopes.insert(user_id.to_string(), envelope.clone());
        Ok(())
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        let mut envelopes = self.envelopes.write().map_err(poisoned)?;
        envelopes.remove(user_id);
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<String>> {
        let envelopes = self.envelopes.read().map_err(poisoned)?;
        let mut users: Vec<String> = envelopes.keys().cloned().collect();
        users.sort();
        Ok(users)
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// File-based storage (one JSON envelope per user).
///
/// Directory layout:
/// ```text
/// envelopes/
///   {user_id}.json
/// ```
pub struct FileEnvelopeStore {
    dir: PathBuf,
}

impl FileEnvelopeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| VaultError::Storage(format!("create dir: {}", e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn envelope_path(&self, user_id: &str) -> Result<PathBuf> {
        let valid = !user_id.is_empty()
            && !user_id.starts_with('.')
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(VaultError::Storage(format!("invalid user id: {:?}", user_id)));
        }
        Ok(self.dir.join(format!("{}.json", user_id)))
    }

    fn read_envelope_file(&self, path: &Path) -> Result<KeyEnvelope> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Storage(format!("read: {}", e)))?;
        KeyEnvelope::from_json(&data)
    }
}

impl EnvelopeStore for FileEnvelopeStore {
    fn get(&self, user_id: &str) -> Result<Option<KeyEnvelope>> {
        let path = self.envelope_path(user_id)?;
        if !path.exists() {
            return Ok(None);
        }
        self.read_envelope_file(&path).map(Some)
    }

    fn put(&self, user_id: &str, envelope: &KeyEnvelope) -> Result<()> {
        let path = self.envelope_path(user_id)?;
        let json = envelope.to_json()?;
        // Atomic write: write to temp, then rename
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &json).map_err(|e| VaultError::Storage(format!("write: {}", e)))?;
        std::fs::rename(&tmp, &path).map_err(|e| VaultError::Storage(format!("rename: {}", e)))?;
        tracing::debug!(user = user_id, path = %path.display(), "stored key envelope");
        Ok(())
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        let path = self.envelope_path(user_id)?;
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| VaultError::Storage(format!("delete: {}", e)))?;
        }
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<String>> {
        let mut users = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| VaultError::Storage(format!("readdir: {}", e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| VaultError::Storage(format!("entry: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                users.push(stem.to_string());
            }
        }
        users.sort();
        Ok(users)
    }
}
