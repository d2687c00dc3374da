//! KDF (passphrase → AES-256 key)
//!
//! key = PBKDF2-HMAC-SHA512(passphrase, salt, 150_000 iterations, len=32)

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::aead::AES_KEY_BYTES;
use crate::error::Result;

/// Iteration count for every vault envelope. Changing it orphans all
/// existing envelopes.
pub const PBKDF2_ITERATIONS: u32 = 150_000;

/// Salt length used when sealing new envelopes.
pub const SALT_BYTES: usize = 16;

pub type DerivedKey = Zeroizing<[u8; AES_KEY_BYTES]>;

pub fn derive_key(passphrase: &str, salt: &[u8]) -> DerivedKey {
    let mut key = Zeroizing::new([0u8; AES_KEY_BYTES]);
    pbkdf2_hmac::<Sha512>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, key.as_mut_slice());
    key
}

/// Same as [`derive_key`], off the async executor.
pub async fn derive_key_blocking(passphrase: &str, salt: &[u8]) -> Result<DerivedKey> {
    let passphrase = Zeroizing::new(passphrase.to_owned());
    let salt = salt.to_vec();
    let key = tokio::task::spawn_blocking(move || derive_key(&passphrase, &salt)).await?;
    Ok(key)
}

pub fn generate_salt() -> Result<[u8; SALT_BYTES]> {
    let mut salt = [0u8; SALT_BYTES];
    getrandom::getrandom(&mut salt)?;
    Ok(salt)
}
