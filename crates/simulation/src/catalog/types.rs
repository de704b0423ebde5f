//! Car, coaster and platform catalog entries.

use std::sync::Arc;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::track_piece::{PieceTypeId, SpriteId, TrackPieceType, TrackVoxel};

/// Number of pitch, roll and yaw steps in a car image cube.
pub const ORIENTATION_STEPS: usize = 16;

/// Images per car type: one per (pitch, roll, yaw).
pub const CAR_IMAGE_COUNT: usize = ORIENTATION_STEPS * ORIENTATION_STEPS * ORIENTATION_STEPS;

/// Tile width (in pixels) the catalog graphics must be drawn for.
pub const TILE_WIDTH: u16 = 64;

/// Kinds of coaster known to the simulation. Kind 0 is invalid.
pub const COASTER_KIND_COUNT: u16 = 2;

/// Track voxels one coaster type may have. Voxel instance data keeps the
/// voxel index above two orientation bits of a `u16`.
pub const MAX_TRACK_VOXELS: usize = 1 << 14;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub struct CarTypeId(pub u16);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub struct CoasterTypeId(pub u16);

/// Platform graphics family of a coaster station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformType(pub u8);

impl PlatformType {
    /// Number of platform types; 0 is the empty platform.
    pub const COUNT: u8 = 3;
    pub const EMPTY: PlatformType = PlatformType(0);
    pub const WOOD: PlatformType = PlatformType(1);
    pub const CONCRETE: PlatformType = PlatformType(2);
}

/// Physical and visual description of a train car.
#[derive(Debug, Clone)]
pub struct CarType {
    pub id: CarTypeId,
    pub tile_width: u16,
    pub z_height: u16,
    /// Length of a car, in track distance units.
    pub car_length: u32,
    /// Gap between two cars of a train, in track distance units.
    pub inter_car_length: u32,
    pub num_passengers: u16,
    /// Rows of seats.
    pub num_entrances: u16,
    /// Image cube indexed `pitch * 256 + roll * 16 + yaw`.
    pub(crate) cars: Vec<Option<SpriteId>>,
}

impl CarType {
    /// Image of the car in the given orientation; `None` means "not drawn".
    pub fn car(&self, pitch: u8, roll: u8, yaw: u8) -> Option<SpriteId> {
        debug_assert!(
            (pitch as usize) < ORIENTATION_STEPS
                && (roll as usize) < ORIENTATION_STEPS
                && (yaw as usize) < ORIENTATION_STEPS,
            "car orientation ({pitch}, {roll}, {yaw}) out of range"
        );
        let idx = pitch as usize * 256 + roll as usize * 16 + yaw as usize;
        self.cars[idx]
    }
}

/// Station platform graphics for one platform type.
#[derive(Debug, Clone, PartialEq)]
pub struct CoasterPlatform {
    pub tile_width: u16,
    pub platform_type: PlatformType,
    /// `(back, front)` sprites per tile edge: NE, SE, SW, NW.
    pub sprites: [(Option<SpriteId>, Option<SpriteId>); 4],
}

impl CoasterPlatform {
    pub fn sprites_for_edge(&self, edge: u8) -> (Option<SpriteId>, Option<SpriteId>) {
        self.sprites[(edge & 3) as usize]
    }
}

/// A kind of roller coaster: its track pieces and train limits.
#[derive(Debug, Clone)]
pub struct CoasterType {
    pub id: CoasterTypeId,
    pub coaster_kind: u16,
    pub platform_type: PlatformType,
    pub max_number_trains: u8,
    pub max_number_cars: u8,
    pub name: String,
    pub pieces: Vec<Arc<TrackPieceType>>,
    /// First entry of each piece in the flattened track voxel table.
    voxel_base: Vec<u16>,
    /// Flattened `(piece index, voxel index)` table.
    voxels: Vec<(usize, usize)>,
}

impl CoasterType {
    pub fn new(
        id: CoasterTypeId,
        coaster_kind: u16,
        platform_type: PlatformType,
        max_number_trains: u8,
        max_number_cars: u8,
        name: String,
        pieces: Vec<Arc<TrackPieceType>>,
    ) -> Self {
        debug_assert!(
            pieces.iter().map(|p| p.voxels.len()).sum::<usize>() <= MAX_TRACK_VOXELS,
            "coaster type {name} has too many track voxels"
        );
        let mut voxel_base = Vec::with_capacity(pieces.len());
        let mut voxels = Vec::new();
        for (pi, piece) in pieces.iter().enumerate() {
            voxel_base.push(voxels.len() as u16);
            voxels.extend((0..piece.voxels.len()).map(|vi| (pi, vi)));
        }
        Self {
            id,
            coaster_kind,
            platform_type,
            max_number_trains,
            max_number_cars,
            name,
            pieces,
            voxel_base,
            voxels,
        }
    }

    pub fn piece_index(&self, piece: PieceTypeId) -> Option<usize> {
        self.pieces.iter().position(|p| p.id == piece)
    }

    /// Ride-local index of a track voxel, stored as voxel instance data.
    pub fn track_voxel_index(&self, piece: PieceTypeId, voxel: usize) -> Option<u16> {
        let pi = self.piece_index(piece)?;
        (voxel < self.pieces[pi].voxels.len()).then(|| self.voxel_base[pi] + voxel as u16)
    }

    /// Track voxel for a ride-local voxel index.
    pub fn track_voxel(&self, index: u16) -> Option<&TrackVoxel> {
        let &(pi, vi) = self.voxels.get(index as usize)?;
        self.pieces[pi].voxels.get(vi)
    }

    pub fn track_voxel_count(&self) -> usize {
        self.voxels.len()
    }
}
