//! Immutable track piece descriptions shared by every placed instance.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::coords::{Orientation, Point3};

/// Reference to a sprite block of a loaded catalog file. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpriteId(pub u32);

/// Catalog-wide identifier of a track piece type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub struct PieceTypeId(pub u32);

/// Connection code of a track end.
///
/// Bits 0-1 hold the tile edge the track leaves through (in travel direction),
/// the remaining bits the track profile (gauge, slope, banking). Two pieces
/// join when the exit code of the first equals the entry code of the second:
/// both describe the same joint seen in the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionCode(pub u8);

impl ConnectionCode {
    pub fn direction(self) -> u8 {
        self.0 & 3
    }

    pub fn profile(self) -> u8 {
        self.0 >> 2
    }

    /// The code after rotating the piece by `orientation`.
    pub fn rotated(self, orientation: Orientation) -> Self {
        let dir = (self.direction() + orientation.quarter_turns()) & 3;
        Self((self.0 & !3) | dir)
    }

    /// Whether a piece exiting with `self` can be followed by a piece entering with `entry`.
    pub fn joins(self, entry: ConnectionCode) -> bool {
        self == entry
    }
}

/// Track piece flag word, as stored in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackFlags(pub u16);

impl TrackFlags {
    pub const PLATFORM: u16 = 1 << 0;
    pub const INITIAL: u16 = 1 << 3;

    pub fn has_platform(self) -> bool {
        self.0 & Self::PLATFORM != 0
    }

    /// Tile edge the platform is on (only meaningful with a platform).
    pub fn platform_direction(self) -> u8 {
        ((self.0 >> 1) & 3) as u8
    }

    pub fn is_initial(self) -> bool {
        self.0 & Self::INITIAL != 0
    }

    pub fn initial_direction(self) -> u8 {
        ((self.0 >> 4) & 3) as u8
    }

    /// 0 = none, 1 = left, 2 = right.
    pub fn banking(self) -> u8 {
        ((self.0 >> 6) & 3) as u8
    }

    /// Signed slope, -3 (vertical down) ..= 3 (vertical up).
    pub fn slope(self) -> i8 {
        decode_signed3((self.0 >> 8) & 7)
    }

    /// Signed bend, negative for left bends.
    pub fn bend(self) -> i8 {
        decode_signed3((self.0 >> 11) & 7)
    }
}

fn decode_signed3(v: u16) -> i8 {
    let v = v as i8;
    if v >= 4 {
        v - 8
    } else {
        v
    }
}

/// One voxel of a piece's footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackVoxel {
    /// Offset from the piece's base voxel.
    pub offset: Point3,
    /// Ride sprites behind the car, one per view orientation.
    pub back: [Option<SpriteId>; 4],
    /// Ride sprites in front of the car, one per view orientation.
    pub front: [Option<SpriteId>; 4],
    pub space: u8,
    pub has_platform: bool,
    /// Tile edge of the platform, before the piece is rotated.
    pub platform_direction: u8,
    pub is_powered: bool,
}

/// One cubic Bezier segment of a curve, covering `[start, last]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub start: u32,
    pub last: u32,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl CubicBezier {
    pub fn value(&self, distance: f64) -> f64 {
        let span = f64::from(self.last - self.start);
        let t = if span > 0.0 {
            ((distance - f64::from(self.start)) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let u = 1.0 - t;
        self.a * u * u * u + 3.0 * self.b * t * u * u + 3.0 * self.c * t * t * u + self.d * t * t * t
    }

    /// A straight segment from `from` to `to`.
    pub fn linear(start: u32, last: u32, from: f64, to: f64) -> Self {
        let third = (to - from) / 3.0;
        Self {
            start,
            last,
            a: from,
            b: from + third,
            c: to - third,
            d: to,
        }
    }
}

/// Piecewise parametric function of the distance travelled within a piece.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackCurve {
    Fixed(f64),
    /// Segments in increasing distance order.
    Bezier(Vec<CubicBezier>),
}

impl TrackCurve {
    pub fn value(&self, distance: f64) -> f64 {
        match self {
            TrackCurve::Fixed(v) => *v,
            TrackCurve::Bezier(segments) => {
                let seg = segments
                    .iter()
                    .find(|s| distance <= f64::from(s.last))
                    .or(segments.last());
                seg.map_or(0.0, |s| s.value(distance))
            }
        }
    }
}

/// A track piece type from the catalog.
///
/// Positions returned by the curves are sub-voxel offsets (256 per voxel)
/// relative to the north bottom corner of the piece's base voxel; the bank
/// curve is in roll steps (16 per full turn).
#[derive(Debug, Clone)]
pub struct TrackPieceType {
    pub id: PieceTypeId,
    pub entry: ConnectionCode,
    pub exit: ConnectionCode,
    /// Voxel where the successor piece starts, relative to the base voxel.
    pub exit_offset: Point3,
    /// Powered speed; non-zero marks a chain lift or launch section.
    pub speed: u8,
    pub flags: TrackFlags,
    pub cost: u32,
    pub voxels: Vec<TrackVoxel>,
    /// Distance units spanned by the piece.
    pub length: u32,
    pub car_x: TrackCurve,
    pub car_y: TrackCurve,
    pub car_z: TrackCurve,
    pub car_roll: TrackCurve,
}

impl TrackPieceType {
    pub fn has_power(&self) -> bool {
        self.speed > 0
    }

    pub fn has_platform(&self) -> bool {
        self.flags.has_platform()
    }

    /// Car position at `distance` into the piece, unrotated, relative to the base voxel.
    pub fn position(&self, distance: u32) -> (f64, f64, f64) {
        debug_assert!(distance <= self.length, "distance {distance} past piece end");
        let d = f64::from(distance);
        (self.car_x.value(d), self.car_y.value(d), self.car_z.value(d))
    }

    /// Bank angle at `distance` into the piece, in roll steps.
    pub fn bank(&self, distance: u32) -> f64 {
        debug_assert!(distance <= self.length, "distance {distance} past piece end");
        self.car_roll.value(f64::from(distance))
    }
}
