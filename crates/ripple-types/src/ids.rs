//! Typed identifiers for participants, items, and wavelets.
//!
//! `ParticipantId` is an address of the form `local@domain`, normalized to
//! lowercase at parse time so equality is by value. A domain-wide participant
//! (`@example.com`) has an empty local part. `ItemId` and `WaveletName` are
//! thin string wrappers; they exist so the three kinds of string can't be
//! mixed up at call sites.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A validated participant address.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

/// Error from participant address validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidAddress {
    #[error("participant address is empty")]
    Empty,
    #[error("participant address '{0}' must contain exactly one '@'")]
    MissingSeparator(String),
    #[error("participant address '{0}' has an empty domain")]
    EmptyDomain(String),
    #[error("participant address '{0}' contains whitespace")]
    Whitespace(String),
}

impl ParticipantId {
    /// Parse and normalize an address.
    pub fn parse(address: &str) -> Result<Self, InvalidAddress> {
        if address.is_empty() {
            return Err(InvalidAddress::Empty);
        }
        if address.chars().any(char::is_whitespace) {
            return Err(InvalidAddress::Whitespace(address.to_string()));
        }
        let mut parts = address.split('@');
        let (_local, domain) = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => (local, domain),
            _ => return Err(InvalidAddress::MissingSeparator(address.to_string())),
        };
        if domain.is_empty() {
            return Err(InvalidAddress::EmptyDomain(address.to_string()));
        }
        Ok(Self(address.to_lowercase()))
    }

    /// The full normalized address.
    pub fn address(&self) -> &str {
        &self.0
    }

    /// The part after `@`.
    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }

    /// True for `@domain` participants that stand for a whole domain.
    pub fn is_domain_participant(&self) -> bool {
        self.0.starts_with('@')
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = InvalidAddress;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> String {
        id.0
    }
}

impl std::str::FromStr for ParticipantId {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", self.0)
    }
}

// ── ItemId ──────────────────────────────────────────────────────────────────

/// Identifier of a content item (blip) within a wavelet.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

// ── WaveletName ─────────────────────────────────────────────────────────────

/// Fully qualified wavelet name: owning domain, wave id, wavelet id.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct WaveletName {
    pub domain: String,
    pub wave_id: String,
    pub wavelet_id: String,
}

impl WaveletName {
    pub fn new(
        domain: impl Into<String>,
        wave_id: impl Into<String>,
        wavelet_id: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            wave_id: wave_id.into(),
            wavelet_id: wavelet_id.into(),
        }
    }

    /// `wave://domain/wave_id/wavelet_id`, the canonical URI form.
    pub fn to_uri(&self) -> String {
        format!("wave://{}/{}/{}", self.domain, self.wave_id, self.wavelet_id)
    }
}

impl fmt::Display for WaveletName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

// ============================================================================
// Tests
// ============================================================================
