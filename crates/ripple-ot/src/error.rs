//! Error types for wavelet operations and transforms.

use ripple_doc::{ContentTransformError, DocOpError};
use ripple_types::{HashedVersion, ItemId, ParticipantId};
use thiserror::Error;

/// An operation could not be applied to the current wavelet state.
///
/// Applying never leaves partial changes behind: every check runs before the
/// first mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Adding a participant who is already on the wavelet.
    #[error("participant {0} is already on the wavelet")]
    DuplicateParticipant(ParticipantId),

    /// Removing a participant who is not on the wavelet.
    #[error("participant {0} is not on the wavelet")]
    MissingParticipant(ParticipantId),

    /// Insertion position past the end of the participant list.
    #[error("insertion index {index} out of range for {len} participants")]
    InvalidParticipantIndex { index: usize, len: usize },

    /// Version bookkeeping against an item that doesn't exist.
    #[error("item {0} does not exist")]
    MissingItem(ItemId),

    /// The content op didn't apply to the item's document.
    #[error("content op failed: {0}")]
    Content(#[from] DocOpError),
}

/// Two concurrent operations cannot be made to commute.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// One side adds a participant the other side removes.
    #[error("concurrent add and remove of participant {0}")]
    ParticipantConflict(ParticipantId),

    /// The other side removed the author of this operation.
    #[error("author {0} was removed concurrently")]
    RemovedAuthor(ParticipantId),

    /// The content transformer rejected the pair.
    #[error("content transform failed: {0}")]
    Content(#[from] ContentTransformError),
}

impl TransformError {
    /// True when the failure is a concurrent removal of the op's author.
    pub fn is_removed_author(&self) -> bool {
        matches!(self, TransformError::RemovedAuthor(_))
    }
}

/// A [`TransformedDelta`](crate::TransformedDelta) invariant is violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeltaInvariantError {
    #[error("op {index} created by {found}, delta author is {expected}")]
    CreatorMismatch {
        index: usize,
        expected: ParticipantId,
        found: ParticipantId,
    },

    #[error("op {index} has version increment {increment}, expected 1")]
    VersionIncrement { index: usize, increment: i64 },

    #[error("op {index} has timestamp {found:?}, expected {expected}")]
    Timestamp {
        index: usize,
        expected: i64,
        found: Option<i64>,
    },

    #[error("op {index} carries a hashed version but is not the last op")]
    HashedVersionNotFinal { index: usize },

    #[error("last op carries {found:?}, expected resulting version {expected}")]
    FinalHashedVersion {
        expected: HashedVersion,
        found: Option<HashedVersion>,
    },
}
