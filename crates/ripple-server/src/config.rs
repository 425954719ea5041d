//! Server configuration, loaded from RON.
//!
//! ```ron
//! (
//!     hash_len: 20,
//!     max_ops_per_delta: 1024,
//!     require_author_participant: true,
//! )
//! ```
//!
//! Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Bytes in a blake3 digest; the upper bound for `hash_len`.
pub const MAX_HASH_LEN: usize = blake3::OUT_LEN;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bytes of history hash kept in each hashed version.
    pub hash_len: usize,
    /// Larger submissions are rejected outright.
    pub max_ops_per_delta: usize,
    /// Reject deltas from non-participants, except on an empty wavelet or
    /// when the delta's first op adds its author.
    pub require_author_participant: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hash_len: 20,
            max_ops_per_delta: 1024,
            require_author_participant: true,
        }
    }
}

impl ServerConfig {
    /// Parse and validate RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a `.ron` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded server config");
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hash_len == 0 || self.hash_len > MAX_HASH_LEN {
            return Err(ConfigError::Invalid(format!(
                "hash_len must be between 1 and {MAX_HASH_LEN}, got {}",
                self.hash_len
            )));
        }
        if self.max_ops_per_delta == 0 {
            return Err(ConfigError::Invalid("max_ops_per_delta must be positive".into()));
        }
        Ok(())
    }
}
