//! One wavelet's authoritative state and history.
//!
//! # Submit pipeline
//!
//! 1. Size checks: empty or oversized deltas are rejected.
//! 2. Every op must be created by the delta's author.
//! 3. The target version must be a delta boundary in history, not ahead of
//!    the current version, with a matching hash.
//! 4. Non-participant authors are rejected (configurable). An author removed
//!    since the target version gets [`TransformError::RemovedAuthor`].
//! 5. The ops are transformed against every history delta applied at or
//!    after the target version.
//! 6. The resulting hashed version chains the previous hash with the author,
//!    the application timestamp, and the op kinds.
//! 7. [`TransformedDelta::clone_operations`] stamps the final contexts.
//! 8. The delta is applied to a scratch copy that replaces the state only
//!    on success.
//! 9. The delta is appended to history.
//!
//! A container is single-writer; [`WaveletRegistry`](crate::WaveletRegistry)
//! serializes access per wavelet.

use std::sync::Arc;

use ripple_doc::ContentTransformer;
use ripple_ot::{
    Delta, OpKind, TransformError, TransformedDelta, WaveletData, WaveletState, transform_ops,
};
use ripple_types::{HashedVersion, WaveletName};

use crate::{HashedVersionFactory, ServerConfig, SubmitError};

pub struct WaveletContainer {
    name: WaveletName,
    config: ServerConfig,
    hasher: HashedVersionFactory,
    transformer: Arc<dyn ContentTransformer>,
    version_zero: HashedVersion,
    state: WaveletData,
    history: Vec<TransformedDelta>,
}

impl WaveletContainer {
    /// Empty wavelet at version zero.
    pub fn new(
        name: WaveletName,
        config: ServerConfig,
        transformer: Arc<dyn ContentTransformer>,
        creation_time: i64,
    ) -> Self {
        let hasher = HashedVersionFactory::new(config.hash_len);
        let version_zero = hasher.version_zero(&name);
        Self {
            state: WaveletData::new(version_zero.clone(), creation_time),
            name,
            config,
            hasher,
            transformer,
            version_zero,
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &WaveletName {
        &self.name
    }

    pub fn state(&self) -> &WaveletData {
        &self.state
    }

    pub fn current_version(&self) -> &HashedVersion {
        self.state.hashed_version()
    }

    pub fn version_zero(&self) -> &HashedVersion {
        &self.version_zero
    }

    pub fn history(&self) -> &[TransformedDelta] {
        &self.history
    }

    /// History deltas applied at or after `version`.
    pub fn deltas_since(&self, version: i64) -> &[TransformedDelta] {
        let start = self
            .history
            .partition_point(|d| d.applied_at_version() < version);
        &self.history[start..]
    }

    /// The recorded hashed version at a delta boundary.
    pub fn hashed_version_at(&self, version: i64) -> Option<&HashedVersion> {
        if version == self.version_zero.version() {
            return Some(&self.version_zero);
        }
        let idx = self
            .history
            .binary_search_by_key(&version, |d| d.resulting_version().version())
            .ok()?;
        Some(self.history[idx].resulting_version())
    }

    /// Transform, apply, and record a client delta.
    pub fn submit(
        &mut self,
        delta: &Delta,
        timestamp: i64,
    ) -> Result<TransformedDelta, SubmitError> {
        match self.try_submit(delta, timestamp) {
            Ok(applied) => {
                tracing::info!(
                    wavelet = %self.name,
                    author = %applied.author(),
                    ops = applied.len(),
                    target = delta.target_version().version(),
                    version = %applied.resulting_version(),
                    "accepted delta"
                );
                Ok(applied)
            }
            Err(e) => {
                tracing::warn!(
                    wavelet = %self.name,
                    author = %delta.author(),
                    target = %delta.target_version(),
                    error = %e,
                    "rejected delta"
                );
                Err(e)
            }
        }
    }

    fn try_submit(
        &mut self,
        delta: &Delta,
        timestamp: i64,
    ) -> Result<TransformedDelta, SubmitError> {
        if delta.is_empty() {
            return Err(SubmitError::EmptyDelta);
        }
        if delta.len() > self.config.max_ops_per_delta {
            return Err(SubmitError::TooManyOps {
                count: delta.len(),
                max: self.config.max_ops_per_delta,
            });
        }
        let author = delta.author();
        if let Some((index, op)) = delta
            .ops()
            .iter()
            .enumerate()
            .find(|(_, op)| op.creator() != author)
        {
            return Err(SubmitError::CreatorMismatch {
                index,
                creator: op.creator().clone(),
                author: author.clone(),
            });
        }

        let target = delta.target_version();
        let current = self.state.version();
        if target.version() > current {
            return Err(SubmitError::VersionAhead {
                target: target.version(),
                current,
            });
        }
        let recorded = self
            .hashed_version_at(target.version())
            .ok_or(SubmitError::UnknownVersion(target.version()))?;
        if recorded != target {
            return Err(SubmitError::HashMismatch {
                target: target.clone(),
                expected: recorded.clone(),
            });
        }

        self.check_author(delta)?;

        let mut ops = delta.ops().to_vec();
        for concurrent in self.deltas_since(target.version()) {
            (ops, _) = transform_ops(&ops, concurrent.ops(), self.transformer.as_ref())?;
        }

        let previous = self.state.hashed_version().clone();
        let resulting = self.hasher.next(&previous, author, timestamp, &ops)?;
        let rebased = Delta::new(delta.author().clone(), previous, ops);
        let applied = TransformedDelta::clone_operations(resulting, timestamp, &rebased);

        let mut scratch = self.state.clone();
        applied.apply(&mut scratch)?;
        self.state = scratch;
        self.history.push(applied.clone());
        Ok(applied)
    }

    fn check_author(&self, delta: &Delta) -> Result<(), SubmitError> {
        if !self.config.require_author_participant || self.state.participants().is_empty() {
            return Ok(());
        }
        let author = delta.author();
        if self.state.is_participant(author) {
            return Ok(());
        }
        let adds_self = matches!(
            delta.ops().first().map(|op| op.kind()),
            Some(OpKind::AddParticipant { participant, .. }) if participant == author
        );
        if adds_self {
            return Ok(());
        }
        let removed_since = self
            .deltas_since(delta.target_version().version())
            .iter()
            .flat_map(TransformedDelta::ops)
            .any(|op| {
                matches!(op.kind(), OpKind::RemoveParticipant { participant } if participant == author)
            });
        if removed_since {
            Err(TransformError::RemovedAuthor(author.clone()).into())
        } else {
            Err(SubmitError::NotParticipant(author.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use ripple_doc::{DocOpBuilder, LinearTransformer};
    use ripple_ot::{ItemState, LocalContextFactory, OpBuilder, OperationContext, WaveletOperation};
    use ripple_types::{ItemId, ParticipantId};

    use super::*;

    fn p(addr: &str) -> ParticipantId {
        ParticipantId::parse(addr).unwrap()
    }

    fn container(config: ServerConfig) -> WaveletContainer {
        WaveletContainer::new(
            WaveletName::new("example.com", "w+1", "conv+root"),
            config,
            Arc::new(LinearTransformer),
            0,
        )
    }

    fn ops(addr: &str) -> OpBuilder<LocalContextFactory> {
        OpBuilder::new(LocalContextFactory::new(p(addr)))
    }

    /// Alice joins, adds bob, and writes "hello" at version 0.
    fn seeded() -> WaveletContainer {
        let mut c = container(ServerConfig::default());
        let alice = ops("alice@x.com");
        let delta = Delta::new(
            p("alice@x.com"),
            c.version_zero().clone(),
            vec![
                alice.add_participant(p("alice@x.com")),
                alice.add_participant(p("bob@x.com")),
                alice.edit_item("b+root", DocOpBuilder::new().characters("hello").build()),
            ],
        );
        c.submit(&delta, 100).unwrap();
        c
    }

    #[test]
    fn test_submit_at_head() {
        let c = seeded();
        assert_eq!(c.state().version(), 3);
        assert_eq!(c.history().len(), 1);
        assert_eq!(c.current_version(), c.history()[0].resulting_version());
        assert_eq!(c.history()[0].applied_at_version(), 0);
        assert_eq!(c.hashed_version_at(3), Some(c.current_version()));
        assert_eq!(c.hashed_version_at(1), None);
        assert_eq!(c.deltas_since(0).len(), 1);
        assert!(c.deltas_since(3).is_empty());
    }

    #[test]
    fn test_concurrent_submissions_converge() {
        let mut c = seeded();
        let v3 = c.current_version().clone();

        let bob = Delta::new(
            p("bob@x.com"),
            v3.clone(),
            vec![ops("bob@x.com").edit_item("b+root", DocOpBuilder::new().retain(5).characters("!").build())],
        );
        let alice = Delta::new(
            p("alice@x.com"),
            v3,
            vec![ops("alice@x.com").edit_item("b+root", DocOpBuilder::new().characters(">").retain(5).build())],
        );
        c.submit(&bob, 200).unwrap();
        let applied = c.submit(&alice, 300).unwrap();

        assert_eq!(applied.applied_at_version(), 4);
        let item = c.state().item(&ItemId::from("b+root")).unwrap();
        assert_eq!(item.content().text(), ">hello!");
        assert_eq!(item.last_modified_time(), 300);
        assert_eq!(c.state().version(), 5);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut c = seeded();
        let before = c.state().clone();
        let head = c.current_version().clone();
        let alice = ops("alice@x.com");

        let empty = Delta::new(p("alice@x.com"), head.clone(), vec![]);
        assert!(matches!(c.submit(&empty, 1), Err(SubmitError::EmptyDelta)));

        let ahead = Delta::new(p("alice@x.com"), HashedVersion::new(9, vec![0; 20]), vec![alice.noop()]);
        assert!(matches!(
            c.submit(&ahead, 1),
            Err(SubmitError::VersionAhead { target: 9, current: 3 })
        ));

        let mid = Delta::new(p("alice@x.com"), HashedVersion::new(1, vec![0; 20]), vec![alice.noop()]);
        assert!(matches!(c.submit(&mid, 1), Err(SubmitError::UnknownVersion(1))));

        let forked = Delta::new(p("alice@x.com"), HashedVersion::new(3, vec![0; 20]), vec![alice.noop()]);
        let err = c.submit(&forked, 1).unwrap_err();
        assert!(matches!(err, SubmitError::HashMismatch { .. }));
        assert!(err.is_conflict());

        let stranger = Delta::new(
            p("eve@x.com"),
            head.clone(),
            vec![ops("eve@x.com").edit_item("b+root", DocOpBuilder::new().retain(5).build())],
        );
        assert!(matches!(c.submit(&stranger, 1), Err(SubmitError::NotParticipant(_))));

        // Removing a participant who isn't there fails at apply time.
        let bad = Delta::new(p("alice@x.com"), head, vec![alice.remove_participant(p("zed@x.com"))]);
        assert!(matches!(c.submit(&bad, 1), Err(SubmitError::Apply(_))));

        assert_eq!(c.state(), &before);
        assert_eq!(c.history().len(), 1);
    }

    #[test]
    fn test_partial_failure_is_atomic() {
        let mut c = seeded();
        let before = c.state().clone();
        let alice = ops("alice@x.com");
        let delta = Delta::new(
            p("alice@x.com"),
            c.current_version().clone(),
            vec![
                alice.add_participant(p("carol@x.com")),
                alice.add_participant(p("carol@x.com")),
            ],
        );
        assert!(matches!(c.submit(&delta, 1), Err(SubmitError::Apply(_))));
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_too_many_ops() {
        let mut c = container(ServerConfig {
            max_ops_per_delta: 1,
            ..ServerConfig::default()
        });
        let alice = ops("alice@x.com");
        let delta = Delta::new(
            p("alice@x.com"),
            c.version_zero().clone(),
            vec![alice.noop(), alice.noop()],
        );
        assert!(matches!(
            c.submit(&delta, 1),
            Err(SubmitError::TooManyOps { count: 2, max: 1 })
        ));
    }

    #[test]
    fn test_self_add_and_open_policy() {
        let mut c = seeded();
        let head = c.current_version().clone();
        let carol = ops("carol@x.com");
        let joins = Delta::new(
            p("carol@x.com"),
            head,
            vec![carol.add_participant(p("carol@x.com")), carol.submit_item("b+root")],
        );
        c.submit(&joins, 1).unwrap();
        assert!(c.state().is_participant(&p("carol@x.com")));

        let mut open = container(ServerConfig {
            require_author_participant: false,
            ..ServerConfig::default()
        });
        let v0 = open.version_zero().clone();
        let eve = ops("eve@x.com");
        open.submit(&Delta::new(p("eve@x.com"), v0, vec![eve.add_participant(p("bob@x.com"))]), 1)
            .unwrap();
        let head = open.current_version().clone();
        open.submit(&Delta::new(p("eve@x.com"), head, vec![eve.noop()]), 2)
            .unwrap();
        assert_eq!(open.state().version(), 2);
    }

    /// Alice adds herself and bob, then removes bob. Returns the container and v2.
    fn bob_removed(config: ServerConfig) -> (WaveletContainer, HashedVersion) {
        let mut c = container(config);
        let alice = ops("alice@x.com");
        let v0 = c.version_zero().clone();
        c.submit(
            &Delta::new(
                p("alice@x.com"),
                v0,
                vec![alice.add_participant(p("alice@x.com")), alice.add_participant(p("bob@x.com"))],
            ),
            10,
        )
        .unwrap();
        let v2 = c.current_version().clone();
        c.submit(
            &Delta::new(p("alice@x.com"), v2.clone(), vec![alice.remove_participant(p("bob@x.com"))]),
            20,
        )
        .unwrap();
        (c, v2)
    }

    #[test]
    fn test_ops_must_be_created_by_author() {
        let open = ServerConfig {
            require_author_participant: false,
            ..ServerConfig::default()
        };

        // A removed author can't slip past the transform by naming someone else.
        let (mut c, v2) = bob_removed(open.clone());
        let disguised = Delta::new(
            p("bob@x.com"),
            v2.clone(),
            vec![ops("carol@x.com").add_participant(p("dave@x.com"))],
        );
        let err = c.submit(&disguised, 30).unwrap_err();
        assert!(matches!(
            err,
            SubmitError::CreatorMismatch { index: 0, ref creator, ref author }
                if creator == &p("carol@x.com") && author == &p("bob@x.com")
        ));
        assert!(!c.state().is_participant(&p("dave@x.com")));

        // An author in good standing isn't judged by a removed op creator.
        let misattributed = Delta::new(
            p("alice@x.com"),
            v2.clone(),
            vec![ops("bob@x.com").add_participant(p("dave@x.com"))],
        );
        let err = c.submit(&misattributed, 30).unwrap_err();
        assert!(matches!(err, SubmitError::CreatorMismatch { .. }));
        assert!(!err.is_removed_author());

        let honest = Delta::new(
            p("alice@x.com"),
            v2,
            vec![ops("alice@x.com").add_participant(p("dave@x.com"))],
        );
        let applied = c.submit(&honest, 30).unwrap();
        assert_eq!(applied.ops()[0].creator(), &p("alice@x.com"));
        assert_eq!(c.history().len(), 3);
    }

    #[test]
    fn test_removed_author_is_reported_with_default_config() {
        let (mut c, v2) = bob_removed(ServerConfig::default());
        let late = Delta::new(p("bob@x.com"), v2, vec![ops("bob@x.com").submit_item("b+root")]);
        let err = c.submit(&late, 30).unwrap_err();
        assert!(err.is_removed_author());

        // Never a participant at all.
        let head = c.current_version().clone();
        let stranger = Delta::new(p("eve@x.com"), head, vec![ops("eve@x.com").noop()]);
        assert!(matches!(c.submit(&stranger, 30), Err(SubmitError::NotParticipant(_))));
    }

    #[test]
    fn test_history_hashes_can_be_recomputed() {
        let mut c = seeded();
        let v3 = c.current_version().clone();
        c.submit(
            &Delta::new(p("bob@x.com"), v3.clone(), vec![ops("bob@x.com").edit_item("b+root", DocOpBuilder::new().retain(5).characters("!").build())]),
            200,
        )
        .unwrap();
        c.submit(
            &Delta::new(p("alice@x.com"), v3, vec![ops("alice@x.com").submit_item("b+root")]),
            300,
        )
        .unwrap();

        let hasher = HashedVersionFactory::new(c.config.hash_len);
        let mut previous = c.version_zero().clone();
        for delta in c.history() {
            assert_eq!(&hasher.for_delta(&previous, delta).unwrap(), delta.resulting_version());
            previous = delta.resulting_version().clone();
        }
        assert_eq!(&previous, c.current_version());
    }

    #[test]
    fn test_client_contexts_do_not_change_resulting_hash() {
        let submit_with = |timestamp: Option<i64>| {
            let mut c = container(ServerConfig::default());
            let v0 = c.version_zero().clone();
            let op = WaveletOperation::add_participant(
                OperationContext::new(p("alice@x.com"), timestamp, 0),
                p("alice@x.com"),
            );
            c.submit(&Delta::new(p("alice@x.com"), v0, vec![op]), 50).unwrap()
        };
        assert_eq!(
            submit_with(None).resulting_version(),
            submit_with(Some(999)).resulting_version()
        );
    }
}
