use std::collections::{BTreeSet, HashMap};

use bevy::prelude::*;

use crate::config::{WORLD_X_SIZE, WORLD_Y_SIZE, WORLD_Z_SIZE};
use crate::coords::Point3;

/// Identifier of a ride instance in the park.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    bitcode::Encode,
    bitcode::Decode,
)]
pub struct RideId(pub u16);

/// Which physical end of a car a display record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CarEnd {
    Back,
    Front,
}

/// Non-owning reference to a car-end display record, resolved through the
/// ride registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CarEndRef {
    pub ride: RideId,
    pub train: u8,
    pub car: u16,
    pub end: CarEnd,
}

/// Ride occupancy of a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoxelInstance {
    #[default]
    Free,
    /// Claimed by a ride; `data` is interpreted by the owning ride (for
    /// coasters: track voxel index and piece orientation).
    Ride { ride: RideId, data: u16 },
}

#[derive(Debug, Clone, Default)]
pub struct Voxel {
    pub instance: VoxelInstance,
    /// Car ends drawn in this voxel, in registration order.
    pub car_ends: Vec<CarEndRef>,
}

impl Voxel {
    pub fn can_place_instance(&self) -> bool {
        self.instance == VoxelInstance::Free
    }

    fn is_empty(&self) -> bool {
        self.instance == VoxelInstance::Free && self.car_ends.is_empty()
    }
}

/// Sparse voxel storage for the coaster core.
///
/// Voxels are created on demand; untouched space costs nothing. The renderer
/// drains `take_dirty` each frame to know which voxels need repainting.
#[derive(Resource, Debug)]
pub struct VoxelWorld {
    pub x_size: i32,
    pub y_size: i32,
    pub z_size: i32,
    voxels: HashMap<Point3, Voxel>,
    dirty: BTreeSet<Point3>,
}

impl Default for VoxelWorld {
    fn default() -> Self {
        Self::new(WORLD_X_SIZE, WORLD_Y_SIZE, WORLD_Z_SIZE)
    }
}

impl VoxelWorld {
    pub fn new(x_size: i32, y_size: i32, z_size: i32) -> Self {
        Self {
            x_size,
            y_size,
            z_size,
            voxels: HashMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn in_bounds(&self, pos: Point3) -> bool {
        (0..self.x_size).contains(&pos.x)
            && (0..self.y_size).contains(&pos.y)
            && (0..self.z_size).contains(&pos.z)
    }

    #[inline]
    pub fn get(&self, pos: Point3) -> Option<&Voxel> {
        self.voxels.get(&pos)
    }

    /// Get the voxel at `pos`, creating an empty one if needed.
    /// Returns `None` outside the world.
    pub fn get_or_create(&mut self, pos: Point3) -> Option<&mut Voxel> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.voxels.entry(pos).or_default())
    }

    /// Whether a ride may claim the voxel at `pos`.
    pub fn can_place_instance(&self, pos: Point3) -> bool {
        self.in_bounds(pos) && self.get(pos).map_or(true, Voxel::can_place_instance)
    }

    pub fn instance_at(&self, pos: Point3) -> VoxelInstance {
        self.get(pos).map(|v| v.instance).unwrap_or_default()
    }

    /// Claim the voxel at `pos` for `ride`. Returns `false` outside the world.
    pub fn set_instance_occupant(&mut self, pos: Point3, ride: RideId, data: u16) -> bool {
        let Some(voxel) = self.get_or_create(pos) else {
            return false;
        };
        voxel.instance = VoxelInstance::Ride { ride, data };
        self.dirty.insert(pos);
        true
    }

    /// Release the voxel at `pos` if `ride` owns it.
    pub fn clear_instance_occupant(&mut self, pos: Point3, ride: RideId) {
        let Some(voxel) = self.voxels.get_mut(&pos) else {
            return;
        };
        debug_assert!(
            matches!(voxel.instance, VoxelInstance::Ride { ride: r, .. } if r == ride),
            "voxel {pos:?} is not owned by {ride:?}"
        );
        voxel.instance = VoxelInstance::Free;
        self.dirty.insert(pos);
        self.prune(pos);
    }

    pub fn add_car_end(&mut self, pos: Point3, car_end: CarEndRef) {
        if let Some(voxel) = self.get_or_create(pos) {
            voxel.car_ends.push(car_end);
            self.dirty.insert(pos);
        }
    }

    pub fn remove_car_end(&mut self, pos: Point3, car_end: CarEndRef) {
        if let Some(voxel) = self.voxels.get_mut(&pos) {
            voxel.car_ends.retain(|c| *c != car_end);
            self.dirty.insert(pos);
            self.prune(pos);
        }
    }

    /// Request a repaint of the voxel at `pos`.
    pub fn mark_dirty(&mut self, pos: Point3) {
        self.dirty.insert(pos);
    }

    pub fn is_dirty(&self, pos: Point3) -> bool {
        self.dirty.contains(&pos)
    }

    /// Drain the set of voxels needing a repaint, in coordinate order.
    pub fn take_dirty(&mut self) -> Vec<Point3> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    /// Number of materialised voxels.
    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    fn prune(&mut self, pos: Point3) {
        if self.voxels.get(&pos).is_some_and(Voxel::is_empty) {
            self.voxels.remove(&pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIDE: RideId = RideId(3);

    fn car_end(car: u16) -> CarEndRef {
        CarEndRef {
            ride: RIDE,
            train: 0,
            car,
            end: CarEnd::Back,
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let mut world = VoxelWorld::new(8, 8, 4);
        assert!(!world.in_bounds(Point3::new(8, 0, 0)));
        assert!(!world.in_bounds(Point3::new(0, -1, 0)));
        assert!(!world.in_bounds(Point3::new(0, 0, 4)));
        assert!(world.get_or_create(Point3::new(0, 0, 4)).is_none());
        assert!(!world.set_instance_occupant(Point3::new(9, 9, 0), RIDE, 0));
    }

    #[test]
    fn test_claim_and_release() {
        let mut world = VoxelWorld::new(8, 8, 4);
        let pos = Point3::new(1, 2, 3);
        assert!(world.can_place_instance(pos));
        assert!(world.set_instance_occupant(pos, RIDE, 7));
        assert!(!world.can_place_instance(pos));
        assert_eq!(world.instance_at(pos), VoxelInstance::Ride { ride: RIDE, data: 7 });

        world.clear_instance_occupant(pos, RIDE);
        assert!(world.can_place_instance(pos));
        assert_eq!(world.voxel_count(), 0, "empty voxels are pruned");
    }

    #[test]
    fn test_car_end_registration_marks_dirty() {
        let mut world = VoxelWorld::new(8, 8, 4);
        let pos = Point3::new(4, 4, 0);
        world.add_car_end(pos, car_end(0));
        world.add_car_end(pos, car_end(1));
        assert_eq!(world.get(pos).map(|v| v.car_ends.len()), Some(2));
        assert_eq!(world.take_dirty(), vec![pos]);
        assert!(world.take_dirty().is_empty());

        world.remove_car_end(pos, car_end(0));
        assert_eq!(world.get(pos).map(|v| v.car_ends.clone()), Some(vec![car_end(1)]));
        assert!(world.is_dirty(pos));
    }
}
