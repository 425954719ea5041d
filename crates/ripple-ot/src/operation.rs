//! Wavelet operations.
//!
//! Every mutation of a wavelet is a [`WaveletOperation`]: an
//! [`OperationContext`] plus one [`OpKind`]. Operations are immutable values;
//! applying one mutates a [`WaveletState`] and never the operation itself.
//!
//! Reversal is split in two steps: [`WaveletOperation::apply_and_return_reverse`]
//! first snapshots everything the undo needs from the target, then applies,
//! then builds the reverse from the snapshot.

use ripple_doc::{DocOp, Document};
use ripple_types::{HashedVersion, ItemId, ParticipantId};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::worthy::{is_item_id_worthy, is_worthy};
use crate::{ContextFactory, ItemState, OperationContext, OperationError, WaveletState};

/// How a content edit changes the item's contributor set.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum AttributionPolicy {
    /// Add the creator as a contributor.
    Add,
    /// Leave contributors alone.
    None,
    /// Remove the creator.
    Remove,
}

/// Last-modified metadata of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub last_modified_time: i64,
    pub last_modified_version: i64,
}

/// An operation on a single item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemOp {
    /// Edit the item's content.
    ///
    /// `restore` and `contributor_index` are only set on reverse edits:
    /// `restore` puts back the item's exact prior metadata instead of deriving
    /// new values from the context, and `contributor_index` is where an `Add`
    /// reinserts the creator.
    ContentEdit {
        content_op: DocOp,
        attribution: AttributionPolicy,
        restore: Option<ItemMetadata>,
        contributor_index: Option<usize>,
    },
    /// Mark the item as submitted.
    Submit,
    NoOp,
}

impl ItemOp {
    pub fn content_edit(content_op: DocOp, attribution: AttributionPolicy) -> Self {
        ItemOp::ContentEdit {
            content_op,
            attribution,
            restore: None,
            contributor_index: None,
        }
    }

    pub fn is_worthy_of_attribution(&self, item_id: &ItemId) -> bool {
        match self {
            ItemOp::ContentEdit { content_op, .. } => {
                is_item_id_worthy(item_id) && is_worthy(content_op)
            }
            ItemOp::Submit | ItemOp::NoOp => false,
        }
    }

    /// Whether applying this op moves the item's last-modified metadata.
    pub fn updates_item_metadata(&self, item_id: &ItemId) -> bool {
        self.is_worthy_of_attribution(item_id)
    }
}

/// The mutation an operation performs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    AddParticipant {
        participant: ParticipantId,
        /// Membership position; `None` appends.
        index: Option<usize>,
    },
    RemoveParticipant {
        participant: ParticipantId,
    },
    Item {
        item_id: ItemId,
        op: ItemOp,
    },
    NoOp,
    /// Version bookkeeping replayed from a server acknowledgement.
    ///
    /// Moves version, hashed version, and (for `touched_item`) the item's
    /// last-modified version. Never touches content and is never transformed.
    VersionUpdate {
        touched_item: Option<ItemId>,
        /// Exact item version to restore; `None` means "the new wavelet version".
        item_version: Option<i64>,
    },
}

/// A context plus the mutation it attributes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveletOperation {
    context: OperationContext,
    kind: OpKind,
}

impl WaveletOperation {
    pub fn new(context: OperationContext, kind: OpKind) -> Self {
        Self { context, kind }
    }

    pub fn add_participant(context: OperationContext, participant: ParticipantId) -> Self {
        Self::new(
            context,
            OpKind::AddParticipant {
                participant,
                index: None,
            },
        )
    }

    pub fn add_participant_at(
        context: OperationContext,
        participant: ParticipantId,
        index: usize,
    ) -> Self {
        Self::new(
            context,
            OpKind::AddParticipant {
                participant,
                index: Some(index),
            },
        )
    }

    pub fn remove_participant(context: OperationContext, participant: ParticipantId) -> Self {
        Self::new(context, OpKind::RemoveParticipant { participant })
    }

    pub fn item(context: OperationContext, item_id: ItemId, op: ItemOp) -> Self {
        Self::new(context, OpKind::Item { item_id, op })
    }

    /// Content edit that credits the creator.
    pub fn content_edit(context: OperationContext, item_id: ItemId, content_op: DocOp) -> Self {
        Self::item(
            context,
            item_id,
            ItemOp::content_edit(content_op, AttributionPolicy::Add),
        )
    }

    pub fn noop(context: OperationContext) -> Self {
        Self::new(context, OpKind::NoOp)
    }

    pub fn context(&self) -> &OperationContext {
        &self.context
    }

    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    pub fn creator(&self) -> &ParticipantId {
        self.context.creator()
    }

    /// Same mutation under a different context.
    pub fn with_context(&self, context: OperationContext) -> Self {
        Self::new(context, self.kind.clone())
    }

    pub fn is_worthy_of_attribution(&self) -> bool {
        match &self.kind {
            OpKind::AddParticipant { .. } | OpKind::RemoveParticipant { .. } => true,
            OpKind::Item { item_id, op } => op.is_worthy_of_attribution(item_id),
            OpKind::NoOp | OpKind::VersionUpdate { .. } => false,
        }
    }

    /// Apply to `target`, then move its version, time, and hashed version.
    pub fn apply<W: WaveletState + ?Sized>(&self, target: &mut W) -> Result<(), OperationError> {
        self.apply_kind(target)?;
        self.context.update_wavelet(target);
        Ok(())
    }

    /// Apply to `target` and return the ops that undo it, in apply order.
    pub fn apply_and_return_reverse<W: WaveletState + ?Sized>(
        &self,
        target: &mut W,
    ) -> Result<Vec<WaveletOperation>, OperationError> {
        let reverse_context = self.context.reverse_for(target);
        let reverse_kind = self.reverse_kind(target)?;
        self.apply(target)?;
        Ok(vec![WaveletOperation::new(reverse_context, reverse_kind)])
    }

    /// The synthetic op that replays this op's acknowledgement.
    ///
    /// Item ops name their item only when applying them moved its metadata.
    pub fn create_version_update_op(
        &self,
        version_increment: i64,
        hashed_version: Option<HashedVersion>,
    ) -> WaveletOperation {
        let touched_item = match &self.kind {
            OpKind::Item { item_id, op } if op.updates_item_metadata(item_id) => {
                Some(item_id.clone())
            }
            _ => None,
        };
        WaveletOperation::new(
            OperationContext::with_hashed_version(
                self.context.creator().clone(),
                None,
                version_increment,
                hashed_version,
            ),
            OpKind::VersionUpdate {
                touched_item,
                item_version: None,
            },
        )
    }

    fn apply_kind<W: WaveletState + ?Sized>(&self, target: &mut W) -> Result<(), OperationError> {
        match &self.kind {
            OpKind::AddParticipant { participant, index } => {
                if target.is_participant(participant) {
                    return Err(OperationError::DuplicateParticipant(participant.clone()));
                }
                let len = target.participants().len();
                if let Some(index) = *index {
                    if index > len {
                        return Err(OperationError::InvalidParticipantIndex { index, len });
                    }
                }
                target.add_participant(participant.clone(), *index);
                Ok(())
            }
            OpKind::RemoveParticipant { participant } => target
                .remove_participant(participant)
                .map(|_| ())
                .ok_or_else(|| OperationError::MissingParticipant(participant.clone())),
            OpKind::Item { item_id, op } => self.apply_item(target, item_id, op),
            OpKind::NoOp => Ok(()),
            OpKind::VersionUpdate {
                touched_item,
                item_version,
            } => {
                if let Some(item_id) = touched_item {
                    let new_version = item_version
                        .unwrap_or(target.version() + self.context.version_increment());
                    target
                        .item_mut(item_id)
                        .ok_or_else(|| OperationError::MissingItem(item_id.clone()))?
                        .set_last_modified_version(new_version);
                }
                Ok(())
            }
        }
    }

    fn apply_item<W: WaveletState + ?Sized>(
        &self,
        target: &mut W,
        item_id: &ItemId,
        op: &ItemOp,
    ) -> Result<(), OperationError> {
        let creator = self.context.creator();
        let wavelet_version = target.version();

        if target.item(item_id).is_none() {
            // Validate against the empty document before creating anything.
            if let ItemOp::ContentEdit { content_op, .. } = op {
                Document::new().apply(content_op)?;
            }
            let created_at = self
                .context
                .timestamp()
                .unwrap_or_else(|| target.last_modified_time());
            tracing::trace!(item = %item_id, creator = %creator, "creating item on first op");
            target.create_item(
                item_id.clone(),
                creator.clone(),
                Vec::new(),
                Document::new(),
                created_at,
                wavelet_version,
            );
        }

        let ItemOp::ContentEdit {
            content_op,
            attribution,
            restore,
            contributor_index,
        } = op
        else {
            return Ok(());
        };

        let item = target
            .item_mut(item_id)
            .ok_or_else(|| OperationError::MissingItem(item_id.clone()))?;
        item.apply_content(content_op)?;

        if op.is_worthy_of_attribution(item_id) {
            match attribution {
                AttributionPolicy::Add => item.add_contributor(creator, *contributor_index),
                AttributionPolicy::Remove => item.remove_contributor(creator),
                AttributionPolicy::None => {}
            }
            match restore {
                Some(meta) => {
                    item.set_last_modified_time(meta.last_modified_time);
                    item.set_last_modified_version(meta.last_modified_version);
                }
                None => {
                    if let Some(ts) = self.context.timestamp() {
                        item.set_last_modified_time(ts);
                    }
                    item.set_last_modified_version(
                        wavelet_version + self.context.version_increment(),
                    );
                }
            }
        }
        Ok(())
    }

    /// What undoes this op against the current (pre-apply) state of `target`.
    fn reverse_kind<W: WaveletState + ?Sized>(&self, target: &W) -> Result<OpKind, OperationError> {
        Ok(match &self.kind {
            OpKind::AddParticipant { participant, .. } => {
                if target.is_participant(participant) {
                    return Err(OperationError::DuplicateParticipant(participant.clone()));
                }
                OpKind::RemoveParticipant {
                    participant: participant.clone(),
                }
            }
            OpKind::RemoveParticipant { participant } => {
                let index = target
                    .participants()
                    .iter()
                    .position(|p| p == participant)
                    .ok_or_else(|| OperationError::MissingParticipant(participant.clone()))?;
                OpKind::AddParticipant {
                    participant: participant.clone(),
                    index: Some(index),
                }
            }
            OpKind::Item { item_id, op } => OpKind::Item {
                item_id: item_id.clone(),
                op: self.reverse_item_op(target, item_id, op),
            },
            OpKind::NoOp => OpKind::NoOp,
            OpKind::VersionUpdate { touched_item, .. } => {
                let item_version = match touched_item {
                    Some(item_id) => Some(
                        target
                            .item(item_id)
                            .ok_or_else(|| OperationError::MissingItem(item_id.clone()))?
                            .last_modified_version(),
                    ),
                    None => None,
                };
                OpKind::VersionUpdate {
                    touched_item: touched_item.clone(),
                    item_version,
                }
            }
        })
    }

    fn reverse_item_op<W: WaveletState + ?Sized>(
        &self,
        target: &W,
        item_id: &ItemId,
        op: &ItemOp,
    ) -> ItemOp {
        let ItemOp::ContentEdit {
            content_op,
            attribution,
            ..
        } = op
        else {
            return ItemOp::NoOp;
        };

        let creator = self.context.creator();
        // A missing item is created by the forward op with these values.
        let (meta, contributor_at) = match target.item(item_id) {
            Some(item) => (
                ItemMetadata {
                    last_modified_time: item.last_modified_time(),
                    last_modified_version: item.last_modified_version(),
                },
                item.contributors().iter().position(|c| c == creator),
            ),
            None => (
                ItemMetadata {
                    last_modified_time: self
                        .context
                        .timestamp()
                        .unwrap_or_else(|| target.last_modified_time()),
                    last_modified_version: target.version(),
                },
                None,
            ),
        };

        let worthy = op.is_worthy_of_attribution(item_id);
        let (reverse_attribution, contributor_index) = match (worthy, attribution, contributor_at) {
            (true, AttributionPolicy::Add, None) => (AttributionPolicy::Remove, None),
            (true, AttributionPolicy::Remove, Some(index)) => (AttributionPolicy::Add, Some(index)),
            _ => (AttributionPolicy::None, None),
        };

        ItemOp::ContentEdit {
            content_op: content_op.invert(),
            attribution: reverse_attribution,
            restore: worthy.then_some(meta),
            contributor_index,
        }
    }
}

/// Mints operations with contexts from an injected factory.
pub struct OpBuilder<F> {
    factory: F,
}

impl<F: ContextFactory> OpBuilder<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    pub fn add_participant(&self, participant: ParticipantId) -> WaveletOperation {
        WaveletOperation::add_participant(self.factory.create_context(), participant)
    }

    pub fn add_participant_at(&self, participant: ParticipantId, index: usize) -> WaveletOperation {
        WaveletOperation::add_participant_at(self.factory.create_context(), participant, index)
    }

    pub fn remove_participant(&self, participant: ParticipantId) -> WaveletOperation {
        WaveletOperation::remove_participant(self.factory.create_context(), participant)
    }

    pub fn edit_item(&self, item_id: impl Into<ItemId>, content_op: DocOp) -> WaveletOperation {
        WaveletOperation::content_edit(self.factory.create_context(), item_id.into(), content_op)
    }

    pub fn edit_item_with(
        &self,
        item_id: impl Into<ItemId>,
        content_op: DocOp,
        attribution: AttributionPolicy,
    ) -> WaveletOperation {
        WaveletOperation::item(
            self.factory.create_context(),
            item_id.into(),
            ItemOp::content_edit(content_op, attribution),
        )
    }

    pub fn submit_item(&self, item_id: impl Into<ItemId>) -> WaveletOperation {
        WaveletOperation::item(self.factory.create_context(), item_id.into(), ItemOp::Submit)
    }

    pub fn touch_item(&self, item_id: impl Into<ItemId>) -> WaveletOperation {
        WaveletOperation::item(self.factory.create_context(), item_id.into(), ItemOp::NoOp)
    }

    pub fn noop(&self) -> WaveletOperation {
        WaveletOperation::noop(self.factory.create_context())
    }
}
