//! Run-scoped mapping from source page ids to the ids their copies received.
//!
//! Entries live densely in insertion order and are addressed by a [`Slot`].
//! The map is insert-once: a key is never overwritten or removed, so a slot
//! stays valid for the life of the map that issued it.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;

use super::error::MigrationError;
use crate::common::{DestinationPageId, SourcePageId};

/// Position of an entry in an [`IdentifierMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Slot(usize);

impl Slot {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A source page together with the destination page created from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedPage {
    pub slot: Slot,
    pub source: SourcePageId,
    pub destination: DestinationPageId,
}

#[derive(Debug, Default)]
pub struct IdentifierMap {
    entries: IndexMap<SourcePageId, DestinationPageId>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `source` was copied to `destination`.
    ///
    /// Fails with [`MigrationError::DuplicateMapping`] if `source` is already
    /// mapped; the existing entry is left untouched.
    pub fn insert(
        &mut self,
        source: SourcePageId,
        destination: DestinationPageId,
    ) -> Result<MappedPage, MigrationError> {
        match self.entries.entry(source) {
            Entry::Occupied(entry) => Err(MigrationError::DuplicateMapping {
                source_id: entry.key().clone(),
                existing: entry.get().clone(),
                attempted: destination,
            }),
            Entry::Vacant(entry) => {
                let mapped = MappedPage {
                    slot: Slot(entry.index()),
                    source: entry.key().clone(),
                    destination: destination.clone(),
                };
                entry.insert(destination);
                Ok(mapped)
            }
        }
    }

    pub fn get(&self, source: &SourcePageId) -> Option<&DestinationPageId> {
        self.entries.get(source)
    }

    pub fn contains(&self, source: &SourcePageId) -> bool {
        self.entries.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&SourcePageId, &DestinationPageId)> {
        self.entries.iter()
    }
}
