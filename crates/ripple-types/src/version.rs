//! Hashed versions.
//!
//! A `HashedVersion` pins a wavelet to an exact point in its history: the
//! version number alone is ambiguous across forks, the history hash is not.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A (version number, history hash) pair.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct HashedVersion {
    version: i64,
    history_hash: Vec<u8>,
}

impl HashedVersion {
    pub fn new(version: i64, history_hash: impl Into<Vec<u8>>) -> Self {
        Self {
            version,
            history_hash: history_hash.into(),
        }
    }

    /// A version with no history hash, for contexts that only need the number.
    pub fn unsigned(version: i64) -> Self {
        Self {
            version,
            history_hash: Vec::new(),
        }
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn history_hash(&self) -> &[u8] {
        &self.history_hash
    }

    pub fn is_unsigned(&self) -> bool {
        self.history_hash.is_empty()
    }
}

impl fmt::Display for HashedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.version, hex::encode(&self.history_hash))
    }
}

impl fmt::Debug for HashedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashedVersion({self})")
    }
}
