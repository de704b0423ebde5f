//! Placed track and loop assembly.
//!
//! A coaster owns its placed pieces in a [`TrackArena`] keyed by stable
//! [`PieceId`]s. [`assemble_loop`] orders them into a [`TrackLoop`] (a
//! separate ordered list with cumulative distances) that the train
//! simulation walks every tick.

mod arena;
mod assembly;
mod positioned;


pub use arena::{PieceId, TrackArena};
pub use assembly::{assemble_loop, LoopAssembly, TrackLoop};
pub use positioned::PositionedTrackPiece;
