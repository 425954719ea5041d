//! Error types for the server crate.

use ripple_ot::{OperationError, TransformError};
use ripple_types::{HashedVersion, ParticipantId};
use thiserror::Error;

/// Why a delta submission was rejected.
///
/// A rejected submission leaves the wavelet untouched.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("delta has no operations")]
    EmptyDelta,

    #[error("delta has {count} operations, limit is {max}")]
    TooManyOps { count: usize, max: usize },

    /// The client claims a version the server hasn't reached.
    #[error("target version {target} is ahead of current version {current}")]
    VersionAhead { target: i64, current: i64 },

    /// The target version falls inside a delta, not on a delta boundary.
    #[error("version {0} is not a delta boundary in history")]
    UnknownVersion(i64),

    /// The client's history diverges from the server's.
    #[error("target {target} does not match history {expected}")]
    HashMismatch {
        target: HashedVersion,
        expected: HashedVersion,
    },

    /// An op names a creator other than the delta's author.
    #[error("op {index} is created by {creator}, delta author is {author}")]
    CreatorMismatch {
        index: usize,
        creator: ParticipantId,
        author: ParticipantId,
    },

    #[error("author {0} is not a participant")]
    NotParticipant(ParticipantId),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("transformed delta failed to apply: {0}")]
    Apply(#[from] OperationError),

    #[error("failed to encode operations: {0}")]
    Encode(#[from] postcard::Error),
}

impl SubmitError {
    /// True when the author was removed by a concurrent delta.
    pub fn is_removed_author(&self) -> bool {
        matches!(self, SubmitError::Transform(e) if e.is_removed_author())
    }

    /// True when the client should resubmit against a newer version.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SubmitError::Transform(_) | SubmitError::HashMismatch { .. })
    }
}

/// Config loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
