use std::ops::{Add, Sub};

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::{SUB_VOXEL_BITS, SUB_VOXEL_SIZE};

/// Integer 3-D point. Used both for voxel coordinates and for sub-voxel
/// positions (256 units per voxel).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct Point3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point3 {
    pub const ZERO: Self = Self::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The sub-voxel position of this voxel's north bottom corner.
    #[inline]
    pub fn to_sub_voxel(self) -> Self {
        Self::new(
            self.x << SUB_VOXEL_BITS,
            self.y << SUB_VOXEL_BITS,
            self.z << SUB_VOXEL_BITS,
        )
    }

    /// The voxel containing this sub-voxel position (drops the sub-voxel bits).
    #[inline]
    pub fn to_voxel(self) -> Self {
        Self::new(
            self.x >> SUB_VOXEL_BITS,
            self.y >> SUB_VOXEL_BITS,
            self.z >> SUB_VOXEL_BITS,
        )
    }
}

impl Add for Point3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Quarter-turn rotation of a placed object around the vertical axis.
///
/// Each step turns 90 degrees counter-clockwise when looking down:
/// the +x axis maps onto +y.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub enum Orientation {
    #[default]
    North,
    East,
    South,
    West,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::East,
        Orientation::South,
        Orientation::West,
    ];

    pub fn from_quarter_turns(turns: u8) -> Self {
        Self::ALL[(turns & 3) as usize]
    }

    pub fn quarter_turns(self) -> u8 {
        self as u8
    }

    /// Rotate a whole-voxel offset.
    pub fn rotate_offset(self, p: Point3) -> Point3 {
        match self {
            Orientation::North => p,
            Orientation::East => Point3::new(-p.y, p.x, p.z),
            Orientation::South => Point3::new(-p.x, -p.y, p.z),
            Orientation::West => Point3::new(p.y, -p.x, p.z),
        }
    }

    /// Rotate a horizontal sub-voxel position around the centre of its base voxel.
    pub fn rotate_sub_voxel(self, x: f64, y: f64) -> (f64, f64) {
        let half = f64::from(SUB_VOXEL_SIZE / 2);
        let (dx, dy) = (x - half, y - half);
        let (rx, ry) = match self {
            Orientation::North => (dx, dy),
            Orientation::East => (-dy, dx),
            Orientation::South => (-dx, -dy),
            Orientation::West => (dy, -dx),
        };
        (rx + half, ry + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voxel_sub_voxel_conversion() {
        let v = Point3::new(3, -2, 7);
        assert_eq!(v.to_sub_voxel(), Point3::new(768, -512, 1792));
        assert_eq!(v.to_sub_voxel().to_voxel(), v);
        // Sub-voxel bits are dropped, negative values round down.
        assert_eq!(Point3::new(767, -1, 255).to_voxel(), Point3::new(2, -1, 0));
    }

    #[test]
    fn test_four_quarter_turns_are_identity() {
        let p = Point3::new(2, 1, 5);
        let mut q = p;
        for _ in 0..4 {
            q = Orientation::East.rotate_offset(q);
        }
        assert_eq!(q, p);
        assert_eq!(Orientation::East.rotate_offset(Point3::new(1, 0, 0)), Point3::new(0, 1, 0));
    }

    #[test]
    fn test_sub_voxel_rotation_keeps_voxel_centre() {
        for o in Orientation::ALL {
            let (x, y) = o.rotate_sub_voxel(128.0, 128.0);
            assert!((x - 128.0).abs() < 1e-9 && (y - 128.0).abs() < 1e-9);
        }
        let (x, y) = Orientation::East.rotate_sub_voxel(512.0, 128.0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 512.0).abs() < 1e-9);
    }
}
