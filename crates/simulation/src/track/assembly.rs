// ---------------------------------------------------------------------------
// Loop assembly: order placed pieces into a single closed circuit
// ---------------------------------------------------------------------------

use super::arena::{PieceId, TrackArena};
use super::positioned::PositionedTrackPiece;

/// The pieces of a coaster in loop order, with cumulative distances.
#[derive(Debug, Clone)]
pub struct TrackLoop {
    ids: Vec<PieceId>,
    pieces: Vec<PositionedTrackPiece>,
    length: u32,
}

impl TrackLoop {
    /// Total length of the circuit.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn ids(&self) -> &[PieceId] {
        &self.ids
    }

    pub fn pieces(&self) -> &[PositionedTrackPiece] {
        &self.pieces
    }

    pub fn piece(&self, index: usize) -> &PositionedTrackPiece {
        &self.pieces[index]
    }

    /// Bring any displacement from the loop start back onto the circuit.
    pub fn wrap(&self, position: i64) -> u32 {
        position.rem_euclid(i64::from(self.length)) as u32
    }

    /// Index of the piece holding `position`, walking from `hint` in the
    /// direction of travel. Any number of pieces may be skipped.
    pub fn locate(&self, hint: usize, position: u32, forward: bool) -> usize {
        debug_assert!(position < self.length, "position {position} not wrapped");
        let n = self.pieces.len();
        let mut idx = hint % n;
        for _ in 0..n {
            if self.pieces[idx].contains(position) {
                return idx;
            }
            idx = if forward { (idx + 1) % n } else { (idx + n - 1) % n };
        }
        idx
    }
}

/// Outcome of [`assemble_loop`].
#[derive(Debug, Clone)]
pub struct LoopAssembly {
    /// Piece order to start the next assembly from.
    pub order: Vec<PieceId>,
    /// The circuit, when the pieces form one.
    pub track: Option<TrackLoop>,
    /// Whether the order or any distance differs from the previous assembly.
    pub changed: bool,
}

/// Try to order the pieces of `arena` into one closed loop.
///
/// `previous` is the order of the last assembly; its surviving pieces keep
/// their relative order and the first of them stays the loop start. Pieces
/// placed since then follow in slot order. On success the distance bases of
/// the pieces are updated; on failure the arena is left untouched.
pub fn assemble_loop(arena: &mut TrackArena, previous: &[PieceId]) -> LoopAssembly {
    let mut order: Vec<PieceId> = previous
        .iter()
        .copied()
        .filter(|&id| arena.contains(id))
        .collect();
    let placed_since: Vec<PieceId> = arena.ids().filter(|id| !order.contains(id)).collect();
    order.extend(placed_since);

    let open = |order: Vec<PieceId>| LoopAssembly {
        order,
        track: None,
        changed: false,
    };

    // A loop needs at least two pieces.
    if order.len() < 2 {
        return open(order);
    }

    let compacted = order.clone();
    let piece = |id: PieceId| arena.get(id);
    let mut distances = Vec::with_capacity(order.len());
    let mut distance = 0u32;
    for i in 0..order.len() {
        if i > 0 {
            let Some(pred) = piece(order[i - 1]) else {
                return open(compacted);
            };
            let found = (i..order.len()).find(|&j| {
                piece(order[j]).is_some_and(|candidate| candidate.can_be_successor(pred))
            });
            match found {
                Some(j) => order.swap(i, j),
                None => return open(compacted),
            }
        }
        let Some(current) = piece(order[i]) else {
            return open(compacted);
        };
        distances.push(distance);
        // A circuit longer than a u32 distance can address never closes.
        let Some(next) = distance.checked_add(current.length()) else {
            return open(compacted);
        };
        distance = next;
    }

    let closes = match (piece(order[0]), piece(order[order.len() - 1])) {
        (Some(first), Some(last)) => first.can_be_successor(last),
        _ => false,
    };
    if !closes {
        return open(compacted);
    }

    let mut changed = order.as_slice() != previous;
    let mut pieces = Vec::with_capacity(order.len());
    for (&id, &base) in order.iter().zip(&distances) {
        if let Some(p) = arena.get_mut(id) {
            if p.distance_base != base {
                p.distance_base = base;
                changed = true;
            }
            pieces.push(p.clone());
        }
    }

    LoopAssembly {
        track: Some(TrackLoop {
            ids: order.clone(),
            pieces,
            length: distance,
        }),
        order,
        changed,
    }
}
