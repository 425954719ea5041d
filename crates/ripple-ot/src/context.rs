//! Per-operation attribution and version metadata.

use ripple_types::{HashedVersion, ParticipantId};
use serde::{Deserialize, Serialize};

use crate::WaveletState;

/// Who made an operation, when, and how it moves the wavelet version.
///
/// `hashed_version` is only meaningful on the last operation of an applied
/// delta. A `None` timestamp means "leave last-modified times alone".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationContext {
    creator: ParticipantId,
    timestamp: Option<i64>,
    version_increment: i64,
    hashed_version: Option<HashedVersion>,
}

impl OperationContext {
    pub fn new(creator: ParticipantId, timestamp: Option<i64>, version_increment: i64) -> Self {
        Self {
            creator,
            timestamp,
            version_increment,
            hashed_version: None,
        }
    }

    /// A context that also stamps the wavelet's hashed version on apply.
    pub fn with_hashed_version(
        creator: ParticipantId,
        timestamp: Option<i64>,
        version_increment: i64,
        hashed_version: Option<HashedVersion>,
    ) -> Self {
        Self {
            creator,
            timestamp,
            version_increment,
            hashed_version,
        }
    }

    pub fn creator(&self) -> &ParticipantId {
        &self.creator
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn version_increment(&self) -> i64 {
        self.version_increment
    }

    pub fn hashed_version(&self) -> Option<&HashedVersion> {
        self.hashed_version.as_ref()
    }

    /// Context for the reverse of an op about to be applied to `target`.
    ///
    /// Captures the wavelet's current time and hashed version, so it must be
    /// taken before the forward op mutates anything.
    pub(crate) fn reverse_for<W: WaveletState + ?Sized>(&self, target: &W) -> Self {
        Self {
            creator: self.creator.clone(),
            timestamp: Some(target.last_modified_time()),
            version_increment: -self.version_increment,
            hashed_version: Some(target.hashed_version().clone()),
        }
    }

    /// Wavelet-level bookkeeping that follows every successful apply.
    pub(crate) fn update_wavelet<W: WaveletState + ?Sized>(&self, target: &mut W) {
        if let Some(ts) = self.timestamp {
            target.set_last_modified_time(ts);
        }
        target.set_version(target.version() + self.version_increment);
        if let Some(hv) = &self.hashed_version {
            target.set_hashed_version(hv.clone());
        }
    }
}

/// Mints contexts for newly created operations.
pub trait ContextFactory {
    fn create_context(&self) -> OperationContext;
}

/// Provisional contexts for locally applied ops: no timestamp, no version
/// movement. The real version arrives later through a version update.
#[derive(Clone, Debug)]
pub struct LocalContextFactory {
    creator: ParticipantId,
}

impl LocalContextFactory {
    pub fn new(creator: ParticipantId) -> Self {
        Self { creator }
    }
}

impl ContextFactory for LocalContextFactory {
    fn create_context(&self) -> OperationContext {
        OperationContext::new(self.creator.clone(), None, 0)
    }
}

/// Contexts stamped with the current time and a version increment of one.
pub struct TimestampedContextFactory<C = fn() -> i64> {
    creator: ParticipantId,
    clock: C,
}

impl TimestampedContextFactory {
    /// Factory reading the system clock.
    pub fn new(creator: ParticipantId) -> Self {
        Self {
            creator,
            clock: ripple_types::now_millis,
        }
    }
}

impl<C: Fn() -> i64> TimestampedContextFactory<C> {
    /// Factory reading time from `clock`.
    pub fn with_clock(creator: ParticipantId, clock: C) -> Self {
        Self { creator, clock }
    }
}

impl<C: Fn() -> i64> ContextFactory for TimestampedContextFactory<C> {
    fn create_context(&self) -> OperationContext {
        OperationContext::new(self.creator.clone(), Some((self.clock)()), 1)
    }
}
