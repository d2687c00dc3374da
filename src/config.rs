//! Runtime configuration.
//!
//! Read from the environment with defaults, the same way the service
//! binaries do it. Cryptographic parameters (iterations, AAD, sizes) are
//! constants, not configuration: changing any of them orphans existing
//! envelopes.

use std::path::PathBuf;

pub const ENV_DATA_DIR: &str = "UNIVERSE_VAULT_DATA_DIR";
pub const ENV_LOG_FORMAT: &str = "UNIVERSE_VAULT_LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./universe-vault-data";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `"json"` (any case) selects JSON; anything else is pretty.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultConfig {
    /// Root of local state; envelopes live in `<data_dir>/envelopes`.
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_format: LogFormat::Pretty,
        }
    }
}

impl VaultConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests, embedding apps).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: lookup(ENV_DATA_DIR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_format: lookup(ENV_LOG_FORMAT)
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
        }
    }

    pub fn envelope_dir(&self) -> PathBuf {
        self.data_dir.join("envelopes")
    }
}
