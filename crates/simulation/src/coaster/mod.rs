//! Roller coaster rides: instances built from catalog types, their trains
//! and the lifecycle from allocation to opening.
//!
//! [`RidesManager`] owns every [`CoasterInstance`]. Track edits go through
//! the instance, which claims voxels in the [`VoxelWorld`](crate::voxel_world::VoxelWorld);
//! [`CoasterInstance::decide_ride_state`] assembles the loop and moves the
//! ride to testing. [`CoasterPlugin`] advances trains every fixed tick.

mod instance;
mod layout;
pub mod orientation;
mod persistence;
mod rides;
mod systems;
mod train;
mod types;


pub use instance::{pack_voxel_data, unpack_voxel_data, CoasterInstance};
pub use layout::{LayoutError, ParkLayout, PieceLayout, RideLayout};
pub use persistence::{PieceRecord, RideRecord, RidesSnapshot, TrainRecord};
pub use rides::RidesManager;
pub use systems::{CoasterPlugin, RideStats};
pub use train::TrainStep;
pub use types::{
    BreakdownState, Car, CarPose, DisplayCar, NewDay, PlacementError, RideEntryResult,
    RideNotification, RideState, RideStateError, Train,
};
