//! Data types for coaster rides: states, trains, car display records,
//! notifications and errors.

use std::fmt;

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::catalog::{CarType, SpriteId};
use crate::coords::Point3;
use crate::track::PieceId;
use crate::voxel_world::{CarEndRef, RideId, VoxelWorld};

// =============================================================================
// Ride state
// =============================================================================

/// Lifecycle state of a ride instance.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub enum RideState {
    /// Created, nothing placed yet.
    #[default]
    Allocated,
    /// Track is being edited or does not form a loop.
    Building,
    /// Closed loop with at least one train, running empty.
    Testing,
    Closed,
    Open,
}

impl fmt::Display for RideState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RideState::Allocated => "allocated",
            RideState::Building => "building",
            RideState::Testing => "testing",
            RideState::Closed => "closed",
            RideState::Open => "open",
        };
        f.write_str(name)
    }
}

/// Breakdown bookkeeping, advanced once per day while the ride is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum BreakdownState {
    /// Never opened; opening draws the first countdown.
    #[default]
    Unopened,
    /// Repaired; the next open day draws a new countdown.
    NeedsNewCountdown,
    /// Days until the ride breaks down.
    WillBreak { days: i32 },
    Broken,
}

/// Answer to a guest trying to board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideEntryResult {
    Entered,
    Full,
    Refused,
}

// =============================================================================
// Events
// =============================================================================

/// Ride changes the park and financial bookkeeping react to.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub enum RideNotification {
    StateChanged {
        ride: RideId,
        from: RideState,
        to: RideState,
    },
    /// Trains and cars were allocated automatically to start testing.
    TrainsAllocated { ride: RideId, trains: usize, cars: usize },
    BrokenDown { ride: RideId },
}

/// A new day started on the park calendar.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct NewDay;

// =============================================================================
// Trains and cars
// =============================================================================

/// Render state of one car end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarPose {
    /// Voxel holding this end of the car.
    pub voxel: Point3,
    /// Offset of the car's centre from the voxel's north bottom corner, in
    /// sub-voxel units. May lie outside `0..256`.
    pub pixel: Point3,
    pub pitch: u8,
    pub roll: u8,
    pub yaw: u8,
}

/// Display record of one car end, registered in the voxel it occupies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayCar {
    pose: Option<CarPose>,
}

impl DisplayCar {
    pub fn pose(&self) -> Option<&CarPose> {
        self.pose.as_ref()
    }

    /// Move the record to `pose`. Nothing happens when the pose is unchanged;
    /// on a voxel change the record moves between the voxels' draw lists.
    /// Returns whether anything changed.
    pub fn set(&mut self, pose: CarPose, world: &mut VoxelWorld, me: CarEndRef) -> bool {
        if self.pose == Some(pose) {
            return false;
        }
        let voxel_changed = self.pose.map_or(true, |old| old.voxel != pose.voxel);
        if let Some(old) = self.pose {
            world.mark_dirty(old.voxel);
            if voxel_changed {
                world.remove_car_end(old.voxel, me);
            }
        }
        self.pose = Some(pose);
        world.mark_dirty(pose.voxel);
        if voxel_changed {
            world.add_car_end(pose.voxel, me);
        }
        true
    }

    /// Take the record out of the world before its car is dropped.
    pub fn clear(&mut self, world: &mut VoxelWorld, me: CarEndRef) {
        if let Some(old) = self.pose.take() {
            world.remove_car_end(old.voxel, me);
        }
    }

    /// Sprite to draw for view orientation `view` (0..4).
    pub fn sprite(&self, car_type: &CarType, view: u8) -> Option<SpriteId> {
        let pose = self.pose?;
        car_type.car(pose.pitch, pose.roll, (pose.yaw + (view & 3) * 4) & 0xF)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Car {
    pub back: DisplayCar,
    pub front: DisplayCar,
}

/// A train running on a coaster loop. A train without cars is unused.
#[derive(Debug, Clone, Default)]
pub struct Train {
    pub cars: Vec<Car>,
    /// Loop distance of the back of the last car, always below the loop length.
    pub back_position: u32,
    /// Distance per millisecond; negative runs backwards.
    pub speed: i32,
    /// Loop index of the piece holding `back_position`.
    pub cur_piece: usize,
}

impl Train {
    pub fn is_used(&self) -> bool {
        !self.cars.is_empty()
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Why a track piece could not be placed or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// Track can only change while the ride is being built.
    NotBuilding(RideState),
    /// The piece type does not belong to this coaster type.
    ForeignPiece,
    /// Part of the piece lies outside the world.
    OffWorld,
    /// The voxel is already claimed.
    Occupied(Point3),
    /// No free piece slot left.
    Full,
    UnknownPiece(PieceId),
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::NotBuilding(state) => {
                write!(f, "Cannot change track while the ride is {state}")
            }
            PlacementError::ForeignPiece => write!(f, "Track piece belongs to another coaster type"),
            PlacementError::OffWorld => write!(f, "Track piece is outside the world"),
            PlacementError::Occupied(p) => {
                write!(f, "Voxel ({}, {}, {}) is already occupied", p.x, p.y, p.z)
            }
            PlacementError::Full => write!(f, "No room for more track pieces"),
            PlacementError::UnknownPiece(id) => write!(f, "No track piece #{}", id.0),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Why a ride operation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RideStateError {
    /// The action is not allowed in the ride's current state.
    InvalidTransition {
        action: &'static str,
        state: RideState,
    },
    UnknownRide(RideId),
    /// The coaster type cannot be built (no car type loaded).
    CannotMakeInstance(String),
    /// Every ride slot is taken.
    TooManyRides,
}

impl fmt::Display for RideStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RideStateError::InvalidTransition { action, state } => {
                write!(f, "Cannot {action} a ride that is {state}")
            }
            RideStateError::UnknownRide(id) => write!(f, "No ride #{}", id.0),
            RideStateError::CannotMakeInstance(name) => {
                write!(f, "Coaster type '{name}' has no car type to run")
            }
            RideStateError::TooManyRides => write!(f, "No free ride slots"),
        }
    }
}

impl std::error::Error for RideStateError {}
