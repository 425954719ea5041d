//! Client deltas and applied (transformed) deltas.

use ripple_types::{HashedVersion, ParticipantId};
use serde::{Deserialize, Serialize};

use crate::{
    DeltaInvariantError, OperationContext, OperationError, WaveletOperation, WaveletState,
};

/// Ops from one author targeting one version. Unvalidated until accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta {
    author: ParticipantId,
    target_version: HashedVersion,
    ops: Vec<WaveletOperation>,
}

impl Delta {
    pub fn new(
        author: ParticipantId,
        target_version: HashedVersion,
        ops: Vec<WaveletOperation>,
    ) -> Self {
        Self {
            author,
            target_version,
            ops,
        }
    }

    pub fn author(&self) -> &ParticipantId {
        &self.author
    }

    pub fn target_version(&self) -> &HashedVersion {
        &self.target_version
    }

    pub fn ops(&self) -> &[WaveletOperation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Version number the wavelet reaches once every op is applied.
    pub fn resulting_version_number(&self) -> i64 {
        self.target_version.version() + self.ops.len() as i64
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = &'a WaveletOperation;
    type IntoIter = std::slice::Iter<'a, WaveletOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// A delta accepted into history.
///
/// Every op is created by `author`, stamped with `application_timestamp`,
/// and increments the version by one. Only the last op carries a hashed
/// version, and it is `resulting_version`. These hold for every value of
/// this type; [`TransformedDelta::try_new`] is the only way to build one from
/// arbitrary parts, and deserialization goes through it too.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TransformedDeltaParts")]
pub struct TransformedDelta {
    author: ParticipantId,
    resulting_version: HashedVersion,
    application_timestamp: i64,
    ops: Vec<WaveletOperation>,
}

/// Unchecked wire form of [`TransformedDelta`]. Field order matches it.
#[derive(Deserialize)]
struct TransformedDeltaParts {
    author: ParticipantId,
    resulting_version: HashedVersion,
    application_timestamp: i64,
    ops: Vec<WaveletOperation>,
}

impl TryFrom<TransformedDeltaParts> for TransformedDelta {
    type Error = DeltaInvariantError;

    fn try_from(parts: TransformedDeltaParts) -> Result<Self, Self::Error> {
        Self::try_new(
            parts.author,
            parts.resulting_version,
            parts.application_timestamp,
            parts.ops,
        )
    }
}

impl TransformedDelta {
    /// Build from parts, panicking if an invariant is broken.
    ///
    /// A broken invariant here means the caller's bookkeeping is wrong.
    pub fn new(
        author: ParticipantId,
        resulting_version: HashedVersion,
        application_timestamp: i64,
        ops: Vec<WaveletOperation>,
    ) -> Self {
        match Self::try_new(author, resulting_version, application_timestamp, ops) {
            Ok(delta) => delta,
            Err(e) => panic!("invalid transformed delta: {e}"),
        }
    }

    /// Build from parts, checking every op context.
    pub fn try_new(
        author: ParticipantId,
        resulting_version: HashedVersion,
        application_timestamp: i64,
        ops: Vec<WaveletOperation>,
    ) -> Result<Self, DeltaInvariantError> {
        let last = ops.len().saturating_sub(1);
        for (index, op) in ops.iter().enumerate() {
            let ctx = op.context();
            if ctx.creator() != &author {
                return Err(DeltaInvariantError::CreatorMismatch {
                    index,
                    expected: author,
                    found: ctx.creator().clone(),
                });
            }
            if ctx.version_increment() != 1 {
                return Err(DeltaInvariantError::VersionIncrement {
                    index,
                    increment: ctx.version_increment(),
                });
            }
            if ctx.timestamp() != Some(application_timestamp) {
                return Err(DeltaInvariantError::Timestamp {
                    index,
                    expected: application_timestamp,
                    found: ctx.timestamp(),
                });
            }
            if index < last && ctx.hashed_version().is_some() {
                return Err(DeltaInvariantError::HashedVersionNotFinal { index });
            }
        }
        if let Some(op) = ops.last() {
            let found = op.context().hashed_version();
            if found != Some(&resulting_version) {
                return Err(DeltaInvariantError::FinalHashedVersion {
                    expected: resulting_version,
                    found: found.cloned(),
                });
            }
        }
        Ok(Self {
            author,
            resulting_version,
            application_timestamp,
            ops,
        })
    }

    /// Promote an accepted client delta into history.
    ///
    /// Each op gets a fresh context: the delta's author, `application_timestamp`,
    /// increment 1, and `resulting_version` on the last op only.
    pub fn clone_operations(
        resulting_version: HashedVersion,
        application_timestamp: i64,
        delta: &Delta,
    ) -> Self {
        let last = delta.len().saturating_sub(1);
        let ops = delta
            .ops()
            .iter()
            .enumerate()
            .map(|(i, op)| {
                let hashed_version = (i == last).then(|| resulting_version.clone());
                op.with_context(OperationContext::with_hashed_version(
                    delta.author().clone(),
                    Some(application_timestamp),
                    1,
                    hashed_version,
                ))
            })
            .collect();
        Self {
            author: delta.author().clone(),
            resulting_version,
            application_timestamp,
            ops,
        }
    }

    pub fn author(&self) -> &ParticipantId {
        &self.author
    }

    pub fn resulting_version(&self) -> &HashedVersion {
        &self.resulting_version
    }

    pub fn application_timestamp(&self) -> i64 {
        self.application_timestamp
    }

    pub fn ops(&self) -> &[WaveletOperation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Version number the delta was applied at.
    pub fn applied_at_version(&self) -> i64 {
        self.resulting_version.version() - self.ops.len() as i64
    }

    /// Apply every op in order.
    ///
    /// Stops at the first failing op; earlier ops stay applied. Callers that
    /// need all-or-nothing apply to a copy.
    pub fn apply<W: WaveletState + ?Sized>(&self, target: &mut W) -> Result<(), OperationError> {
        self.ops.iter().try_for_each(|op| op.apply(target))
    }
}

impl<'a> IntoIterator for &'a TransformedDelta {
    type Item = &'a WaveletOperation;
    type IntoIter = std::slice::Iter<'a, WaveletOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
