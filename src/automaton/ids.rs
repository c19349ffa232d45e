//! Transient subject identifiers.
//!
//! Orders name their subject by descriptor, but a descriptor only says where
//! something is, not what it is. When the action phase starts every owned
//! tile and every unit gets a fresh id; queued orders remember the id of
//! their subject, and an order whose descriptor no longer resolves to the
//! same id has lost its subject. The map follows units as they move and
//! forgets tokens that die, so it stays valid for the whole phase.

use std::collections::BTreeMap;

use crate::game::{Board, Descriptor};

/// Identity of one token during an action phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectId(u32);

impl SubjectId {
    /// Never assigned; orders holding it always fail verification.
    pub const STALE: SubjectId = SubjectId(u32::MAX);
}

/// Descriptor to id map, rebuilt at the start of every action phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectIds {
    ids: BTreeMap<Descriptor, SubjectId>,
    next: u32,
}

impl SubjectIds {
    /// Forget everything and number every owned tile and unit, row-major,
    /// tile before ground before air before bypass.
    pub fn assign(&mut self, board: &Board) {
        self.ids.clear();
        self.next = 0;
        for (position, space) in board.iter() {
            if space.tile.is_owned() {
                self.insert(Descriptor::tile(position));
            }
            for (layer, _) in space.units() {
                self.insert(Descriptor::unit(layer, position));
            }
        }
    }

    /// Give `subject` a fresh id.
    pub fn insert(&mut self, subject: Descriptor) -> SubjectId {
        let id = SubjectId(self.next);
        self.next = self.next.saturating_add(1);
        self.ids.insert(subject, id);
        id
    }

    /// Current id at `subject`.
    #[must_use]
    pub fn get(&self, subject: Descriptor) -> Option<SubjectId> {
        self.ids.get(&subject).copied()
    }

    /// Id at `subject`, or [`SubjectId::STALE`].
    #[must_use]
    pub fn resolve(&self, subject: Descriptor) -> SubjectId {
        self.get(subject).unwrap_or(SubjectId::STALE)
    }

    /// Carry the id at `from` over to `to`.
    pub fn relocate(&mut self, from: Descriptor, to: Descriptor) {
        if let Some(id) = self.ids.remove(&from) {
            self.ids.insert(to, id);
        }
    }

    /// Forget `subject`.
    pub fn remove(&mut self, subject: Descriptor) {
        self.ids.remove(&subject);
    }

    /// Every descriptor with an id.
    pub fn descriptors(&self) -> impl Iterator<Item = Descriptor> + '_ {
        self.ids.keys().copied()
    }

    /// Number of ids handed out and still valid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no token has an id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
