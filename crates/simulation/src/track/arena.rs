use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::MAX_PLACED_TRACK_PIECES;

use super::positioned::PositionedTrackPiece;

/// Stable handle of a placed piece within its coaster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub struct PieceId(pub u16);

/// Slot storage for the placed pieces of one coaster.
///
/// Removing a piece leaves a free slot that the next insertion reuses; ids of
/// other pieces never change.
#[derive(Debug, Clone)]
pub struct TrackArena {
    slots: Vec<Option<PositionedTrackPiece>>,
    capacity: usize,
    count: usize,
}

impl Default for TrackArena {
    fn default() -> Self {
        Self::with_capacity(MAX_PLACED_TRACK_PIECES)
    }
}

impl TrackArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    /// Store a piece in the first free slot. `None` when the arena is full.
    pub fn insert(&mut self, piece: PositionedTrackPiece) -> Option<PieceId> {
        if self.is_full() {
            return None;
        }
        let idx = match self.slots.iter().position(Option::is_none) {
            Some(idx) => {
                self.slots[idx] = Some(piece);
                idx
            }
            None => {
                self.slots.push(Some(piece));
                self.slots.len() - 1
            }
        };
        self.count += 1;
        Some(PieceId(idx as u16))
    }

    pub fn remove(&mut self, id: PieceId) -> Option<PositionedTrackPiece> {
        let removed = self.slots.get_mut(id.0 as usize)?.take();
        if removed.is_some() {
            self.count -= 1;
        }
        removed
    }

    pub fn get(&self, id: PieceId) -> Option<&PositionedTrackPiece> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: PieceId) -> Option<&mut PositionedTrackPiece> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    pub fn contains(&self, id: PieceId) -> bool {
        self.get(id).is_some()
    }

    /// Occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PieceId, &PositionedTrackPiece)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|p| (PieceId(i as u16), p)))
    }

    pub fn ids(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// First occupied slot.
    pub fn first_placed(&self) -> Option<PieceId> {
        self.ids().next()
    }

    /// Empty every slot, returning the pieces that were stored.
    pub fn drain(&mut self) -> Vec<PositionedTrackPiece> {
        self.count = 0;
        self.slots.drain(..).flatten().collect()
    }
}
