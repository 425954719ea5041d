//! History hashing.
//!
//! Each applied delta's hashed version chains the previous history hash
//! with the delta as history records it, so two servers agree on a version's
//! hash only if they agree on every delta before it.

use ripple_ot::{OpKind, TransformedDelta, WaveletOperation};
use ripple_types::{HashedVersion, ParticipantId, WaveletName};

const TYPE_VERSION_ZERO: u8 = 0;
const TYPE_DELTA: u8 = 1;

/// Mints hashed versions truncated to a fixed length.
#[derive(Clone, Copy, Debug)]
pub struct HashedVersionFactory {
    hash_len: usize,
}

impl HashedVersionFactory {
    /// `hash_len` is clamped to `1..=32`.
    pub fn new(hash_len: usize) -> Self {
        Self {
            hash_len: hash_len.clamp(1, blake3::OUT_LEN),
        }
    }

    pub fn hash_len(&self) -> usize {
        self.hash_len
    }

    /// Version 0 of a wavelet, seeded by its name.
    pub fn version_zero(&self, name: &WaveletName) -> HashedVersion {
        let uri = name.to_uri();
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[TYPE_VERSION_ZERO]);
        hasher.update(&(uri.len() as u64).to_le_bytes());
        hasher.update(uri.as_bytes());
        HashedVersion::new(0, self.truncate(hasher.finalize()))
    }

    /// The version reached when `author` applies `ops` on top of `previous`.
    ///
    /// Only the author, the application timestamp, and each op's kind are
    /// hashed. Op contexts are restamped on acceptance and never count.
    pub fn next(
        &self,
        previous: &HashedVersion,
        author: &ParticipantId,
        application_timestamp: i64,
        ops: &[WaveletOperation],
    ) -> Result<HashedVersion, postcard::Error> {
        let kinds: Vec<&OpKind> = ops.iter().map(WaveletOperation::kind).collect();
        let encoded = postcard::to_allocvec(&(author, application_timestamp, kinds))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[TYPE_DELTA]);
        hasher.update(&previous.version().to_le_bytes());
        hasher.update(&(previous.history_hash().len() as u64).to_le_bytes());
        hasher.update(previous.history_hash());
        hasher.update(&(encoded.len() as u64).to_le_bytes());
        hasher.update(&encoded);
        Ok(HashedVersion::new(
            previous.version() + ops.len() as i64,
            self.truncate(hasher.finalize()),
        ))
    }

    /// Recompute the resulting version of a history delta applied on top of
    /// `previous`.
    pub fn for_delta(
        &self,
        previous: &HashedVersion,
        delta: &TransformedDelta,
    ) -> Result<HashedVersion, postcard::Error> {
        self.next(
            previous,
            delta.author(),
            delta.application_timestamp(),
            delta.ops(),
        )
    }

    fn truncate(&self, hash: blake3::Hash) -> Vec<u8> {
        hash.as_bytes()[..self.hash_len].to_vec()
    }
}
