//! The wavelet state that operations mutate.
//!
//! Operations never touch storage directly; they go through these traits.
//! [`WaveletData`] is the in-memory implementation.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use ripple_doc::{DocOp, DocOpError, Document};
use ripple_types::{HashedVersion, ItemId, ParticipantId};
use serde::{Deserialize, Serialize};

/// A content item as seen by operations.
pub trait ItemState {
    fn author(&self) -> &ParticipantId;
    fn content(&self) -> &Document;
    /// Apply a content op. Must leave the content unchanged on error.
    fn apply_content(&mut self, op: &DocOp) -> Result<(), DocOpError>;
    fn contributors(&self) -> &[ParticipantId];
    /// Add a contributor at `index`, or last for `None`; no-op if already present.
    fn add_contributor(&mut self, participant: &ParticipantId, index: Option<usize>);
    fn remove_contributor(&mut self, participant: &ParticipantId);
    fn last_modified_time(&self) -> i64;
    fn set_last_modified_time(&mut self, time: i64);
    fn last_modified_version(&self) -> i64;
    fn set_last_modified_version(&mut self, version: i64);
}

/// A wavelet as seen by operations.
pub trait WaveletState {
    type Item: ItemState;

    /// Participants in membership order.
    fn participants(&self) -> &[ParticipantId];
    /// Insert at `index`, or append when `None`. Callers validate first.
    fn add_participant(&mut self, participant: ParticipantId, index: Option<usize>);
    /// Remove and return the former position, `None` if absent.
    fn remove_participant(&mut self, participant: &ParticipantId) -> Option<usize>;

    fn item(&self, id: &ItemId) -> Option<&Self::Item>;
    fn item_mut(&mut self, id: &ItemId) -> Option<&mut Self::Item>;
    fn create_item(
        &mut self,
        id: ItemId,
        author: ParticipantId,
        contributors: Vec<ParticipantId>,
        content: Document,
        last_modified_time: i64,
        last_modified_version: i64,
    ) -> &mut Self::Item;

    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
    fn hashed_version(&self) -> &HashedVersion;
    fn set_hashed_version(&mut self, version: HashedVersion);
    fn last_modified_time(&self) -> i64;
    fn set_last_modified_time(&mut self, time: i64);

    fn is_participant(&self, participant: &ParticipantId) -> bool {
        self.participants().contains(participant)
    }
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// In-memory item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData {
    id: ItemId,
    author: ParticipantId,
    contributors: Vec<ParticipantId>,
    content: Document,
    last_modified_time: i64,
    last_modified_version: i64,
}

impl ItemData {
    pub fn id(&self) -> &ItemId {
        &self.id
    }
}

impl ItemState for ItemData {
    fn author(&self) -> &ParticipantId {
        &self.author
    }

    fn content(&self) -> &Document {
        &self.content
    }

    fn apply_content(&mut self, op: &DocOp) -> Result<(), DocOpError> {
        self.content.apply(op)
    }

    fn contributors(&self) -> &[ParticipantId] {
        &self.contributors
    }

    fn add_contributor(&mut self, participant: &ParticipantId, index: Option<usize>) {
        if self.contributors.contains(participant) {
            return;
        }
        match index {
            Some(i) => self.contributors.insert(i.min(self.contributors.len()), participant.clone()),
            None => self.contributors.push(participant.clone()),
        }
    }

    fn remove_contributor(&mut self, participant: &ParticipantId) {
        self.contributors.retain(|p| p != participant);
    }

    fn last_modified_time(&self) -> i64 {
        self.last_modified_time
    }

    fn set_last_modified_time(&mut self, time: i64) {
        self.last_modified_time = time;
    }

    fn last_modified_version(&self) -> i64 {
        self.last_modified_version
    }

    fn set_last_modified_version(&mut self, version: i64) {
        self.last_modified_version = version;
    }
}

/// In-memory wavelet: ordered participants, items by id, version metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveletData {
    participants: Vec<ParticipantId>,
    items: BTreeMap<ItemId, ItemData>,
    version: i64,
    hashed_version: HashedVersion,
    last_modified_time: i64,
}

impl WaveletData {
    /// Empty wavelet at `version_zero`.
    pub fn new(version_zero: HashedVersion, creation_time: i64) -> Self {
        Self {
            participants: Vec::new(),
            items: BTreeMap::new(),
            version: version_zero.version(),
            hashed_version: version_zero,
            last_modified_time: creation_time,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemData> {
        self.items.values()
    }
}

impl WaveletState for WaveletData {
    type Item = ItemData;

    fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    fn add_participant(&mut self, participant: ParticipantId, index: Option<usize>) {
        match index {
            Some(i) => self.participants.insert(i.min(self.participants.len()), participant),
            None => self.participants.push(participant),
        }
    }

    fn remove_participant(&mut self, participant: &ParticipantId) -> Option<usize> {
        let pos = self.participants.iter().position(|p| p == participant)?;
        self.participants.remove(pos);
        Some(pos)
    }

    fn item(&self, id: &ItemId) -> Option<&ItemData> {
        self.items.get(id)
    }

    fn item_mut(&mut self, id: &ItemId) -> Option<&mut ItemData> {
        self.items.get_mut(id)
    }

    fn create_item(
        &mut self,
        id: ItemId,
        author: ParticipantId,
        contributors: Vec<ParticipantId>,
        content: Document,
        last_modified_time: i64,
        last_modified_version: i64,
    ) -> &mut ItemData {
        let item = ItemData {
            id: id.clone(),
            author,
            contributors,
            content,
            last_modified_time,
            last_modified_version,
        };
        match self.items.entry(id) {
            Entry::Occupied(mut entry) => {
                entry.insert(item);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(item),
        }
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn hashed_version(&self) -> &HashedVersion {
        &self.hashed_version
    }

    fn set_hashed_version(&mut self, version: HashedVersion) {
        self.hashed_version = version;
    }

    fn last_modified_time(&self) -> i64 {
        self.last_modified_time
    }

    fn set_last_modified_time(&mut self, time: i64) {
        self.last_modified_time = time;
    }
}
