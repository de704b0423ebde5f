pub const WORLD_X_SIZE: i32 = 128;
pub const WORLD_Y_SIZE: i32 = 128;
pub const WORLD_Z_SIZE: i32 = 64;

/// Sub-voxel resolution: a voxel is 256 units wide along every axis.
pub const SUB_VOXEL_BITS: u32 = 8;
pub const SUB_VOXEL_SIZE: i32 = 1 << SUB_VOXEL_BITS;

/// Fixed simulation rate. One tick advances trains by `TICK_MILLIS`.
pub const TICK_HZ: f64 = 10.0;
pub const TICK_MILLIS: u32 = 100;

/// Slots available for positioned track pieces of a single coaster.
pub const MAX_PLACED_TRACK_PIECES: usize = 1024;

/// Trains a single coaster can run, independent of the type maximum.
pub const MAX_TRAINS_PER_COASTER: usize = 4;

/// Car types the catalog accepts (compatibility with the fixed asset table).
pub const MAX_CAR_TYPES: usize = 16;

/// Ride instance slots in the park.
pub const MAX_RIDE_INSTANCES: usize = 64;

/// Gravity along the track, in speed units per sample.
pub const GRAVITY: f64 = 9.8;

/// Speed floor on powered and station pieces (chain lift / launch).
pub const MIN_CRAWL_SPEED: i32 = 65536 / 1000;

/// Mean days between breakdowns for a freshly built ride.
pub const DEFAULT_RELIABILITY: u32 = 365 / 2;

/// Days added to the first breakdown countdown after opening.
pub const BREAKDOWN_GRACE_PERIOD: i32 = 30;
