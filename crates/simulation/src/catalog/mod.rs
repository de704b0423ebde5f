//! Ride catalog: track pieces, car types, coaster types and platforms.
//!
//! Entries are loaded from RCD files (see [`loader`]) into an explicitly
//! constructed [`Catalog`] resource, then shared by `Arc` with every placed
//! piece and ride instance. Nothing in the catalog changes after loading.

pub mod demo;
pub mod loader;
mod registry;
pub mod track_piece;
pub mod types;

#[cfg(test)]
mod tests;

pub use loader::{load_rcd_bytes, load_rcd_file, LoadReport};
pub use registry::Catalog;
pub use track_piece::{
    ConnectionCode, CubicBezier, PieceTypeId, SpriteId, TrackCurve, TrackFlags, TrackPieceType,
    TrackVoxel,
};
pub use types::{
    CarType, CarTypeId, CoasterPlatform, CoasterType, CoasterTypeId, PlatformType,
    CAR_IMAGE_COUNT, MAX_TRACK_VOXELS,
};
