use std::sync::Arc;

use crate::catalog::{ConnectionCode, TrackPieceType};
use crate::coords::{Orientation, Point3};
use crate::voxel_world::VoxelWorld;

/// A track piece type anchored in the world.
#[derive(Debug, Clone)]
pub struct PositionedTrackPiece {
    pub piece: Arc<TrackPieceType>,
    pub base_voxel: Point3,
    pub orientation: Orientation,
    /// Loop distance at the start of the piece. Only meaningful after a
    /// successful loop assembly.
    pub distance_base: u32,
}

impl PositionedTrackPiece {
    pub fn new(piece: Arc<TrackPieceType>, base_voxel: Point3, orientation: Orientation) -> Self {
        Self {
            piece,
            base_voxel,
            orientation,
            distance_base: 0,
        }
    }

    pub fn length(&self) -> u32 {
        self.piece.length
    }

    /// Loop distance just past the end of the piece.
    pub fn end_distance(&self) -> u32 {
        self.distance_base + self.piece.length
    }

    /// Whether loop position `position` lies on this piece (`[base, base + length)`).
    pub fn contains(&self, position: u32) -> bool {
        position >= self.distance_base && position < self.end_distance()
    }

    /// Voxel where a successor piece must start.
    pub fn end_voxel(&self) -> Point3 {
        self.base_voxel + self.orientation.rotate_offset(self.piece.exit_offset)
    }

    pub fn entry_code(&self) -> ConnectionCode {
        self.piece.entry.rotated(self.orientation)
    }

    pub fn exit_code(&self) -> ConnectionCode {
        self.piece.exit.rotated(self.orientation)
    }

    /// Can this piece continue track that ends at `voxel` with `exit_code`?
    pub fn can_be_successor_at(&self, voxel: Point3, exit_code: ConnectionCode) -> bool {
        self.base_voxel == voxel && exit_code.joins(self.entry_code())
    }

    /// Can this piece directly follow `pred`?
    pub fn can_be_successor(&self, pred: &PositionedTrackPiece) -> bool {
        self.can_be_successor_at(pred.end_voxel(), pred.exit_code())
    }

    /// World voxels of the footprint, paired with their index in the piece.
    pub fn voxels(&self) -> impl Iterator<Item = (usize, Point3)> + '_ {
        self.piece
            .voxels
            .iter()
            .enumerate()
            .map(|(i, tv)| (i, self.base_voxel + self.orientation.rotate_offset(tv.offset)))
    }

    /// Whether the whole footprint lies inside the world.
    pub fn is_on_world(&self, world: &VoxelWorld) -> bool {
        self.voxels().all(|(_, v)| world.in_bounds(v))
    }

    /// Whether the footprint is in the world and every voxel is free.
    pub fn can_be_placed(&self, world: &VoxelWorld) -> bool {
        self.is_on_world(world) && self.voxels().all(|(_, v)| world.can_place_instance(v))
    }

    /// Car position in world sub-voxel coordinates, `distance` into the piece.
    ///
    /// The z curve is stored at half scale (voxels are half as tall as wide)
    /// and is doubled here.
    pub fn car_position(&self, distance: u32) -> (i32, i32, i32) {
        let (x, y, z) = self.piece.position(distance);
        let (x, y) = self.orientation.rotate_sub_voxel(x, y);
        let base = self.base_voxel.to_sub_voxel();
        (
            x as i32 + base.x,
            y as i32 + base.y,
            (z * 2.0) as i32 + base.z,
        )
    }

    /// Bank angle in roll steps, `distance` into the piece.
    pub fn bank(&self, distance: u32) -> f64 {
        self.piece.bank(distance)
    }

    pub fn has_power(&self) -> bool {
        self.piece.has_power()
    }

    pub fn has_platform(&self) -> bool {
        self.piece.has_platform()
    }
}
