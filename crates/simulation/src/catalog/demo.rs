//! Block writers for catalog files and the built-in demo coaster.
//!
//! The demo catalog holds one coaster type with four pieces: a straight, a
//! station straight, a powered lift straight and a quarter-turn to the left.
//! Distances are in 1/65536 voxel, so a straight piece is 65536 long.

use std::sync::Arc;

use crate::rcd::RcdWriter;

use super::registry::Catalog;
use super::track_piece::{TrackFlags, TrackPieceType};
use super::types::{CoasterType, CAR_IMAGE_COUNT, TILE_WIDTH};

pub const DEMO_COASTER_NAME: &str = "Demo Coaster";

/// Track distance units per voxel width.
pub const DISTANCE_PER_VOXEL: u32 = 65536;
pub const STRAIGHT_LENGTH: u32 = DISTANCE_PER_VOXEL;
/// Quarter circle with a radius of half a voxel.
pub const TURN_LENGTH: u32 = 51472;

pub const DEMO_CAR_LENGTH: u32 = 40000;
pub const DEMO_INTER_CAR_LENGTH: u32 = 8000;

/// Flat track profile, travelling in direction 0 (+x).
pub const FLAT: u8 = 1 << 2;

/// Bezier control factor for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// A curve as stored in a `TRCK` block.
#[derive(Debug, Clone)]
pub enum CurveBlock {
    Fixed(f32),
    /// `(start, last, [a, b, c, d])` per segment.
    Bezier(Vec<(u32, u32, [f32; 4])>),
}

impl CurveBlock {
    pub fn linear(length: u32, from: f32, to: f32) -> Self {
        let third = (to - from) / 3.0;
        CurveBlock::Bezier(vec![(0, length, [from, from + third, to - third, to])])
    }
}

/// Field values of a `TRCK` block.
#[derive(Debug, Clone)]
pub struct PieceBlock {
    pub entry: u8,
    pub exit: u8,
    pub exit_offset: (i8, i8, i8),
    pub speed: u8,
    pub flags: u16,
    pub cost: u32,
    /// Voxel offsets; every voxel uses `sprite` as its back sprite in all views.
    pub voxels: Vec<(i8, i8, i8)>,
    pub sprite: u32,
    pub length: u32,
    pub car_x: CurveBlock,
    pub car_y: CurveBlock,
    pub car_z: CurveBlock,
    pub car_roll: CurveBlock,
}

impl PieceBlock {
    /// A flat straight along +x through one voxel.
    pub fn straight(sprite: u32) -> Self {
        Self {
            entry: FLAT,
            exit: FLAT,
            exit_offset: (1, 0, 0),
            speed: 0,
            flags: 0,
            cost: 100,
            voxels: vec![(0, 0, 0)],
            sprite,
            length: STRAIGHT_LENGTH,
            car_x: CurveBlock::linear(STRAIGHT_LENGTH, 0.0, 256.0),
            car_y: CurveBlock::Fixed(128.0),
            car_z: CurveBlock::Fixed(0.0),
            car_roll: CurveBlock::Fixed(0.0),
        }
    }

    /// Flat quarter-turn entering along +x and leaving along +y.
    pub fn turn_left(sprite: u32) -> Self {
        let k = 128.0 * KAPPA;
        Self {
            entry: FLAT,
            exit: FLAT | 1,
            exit_offset: (0, 1, 0),
            cost: 150,
            length: TURN_LENGTH,
            car_x: CurveBlock::Bezier(vec![(0, TURN_LENGTH, [0.0, k, 128.0, 128.0])]),
            car_y: CurveBlock::Bezier(vec![(
                0,
                TURN_LENGTH,
                [128.0, 128.0, 256.0 - k, 256.0],
            )]),
            ..Self::straight(sprite)
        }
    }
}

fn write_curve(w: &mut crate::rcd::BlockWriter, curve: &CurveBlock) {
    match curve {
        CurveBlock::Fixed(v) => {
            w.u8(1).f32(*v);
        }
        CurveBlock::Bezier(segments) => {
            w.u8(2).u8(segments.len() as u8);
            for (start, last, [a, b, c, d]) in segments {
                w.u32(*start).u32(*last).f32(*a).f32(*b).f32(*c).f32(*d);
            }
        }
    }
}

/// Append a sprite block, returning its block number.
pub fn write_sprite(rcd: &mut RcdWriter) -> u32 {
    rcd.block(*b"8PXL", 2, |w| {
        w.u16(1).u16(1).u8(0);
    })
}

pub fn write_track_piece(rcd: &mut RcdWriter, piece: &PieceBlock) -> u32 {
    rcd.block(*b"TRCK", super::loader::TRCK_VERSION, |w| {
        w.u8(piece.entry)
            .u8(piece.exit)
            .i8(piece.exit_offset.0)
            .i8(piece.exit_offset.1)
            .i8(piece.exit_offset.2)
            .u8(piece.speed)
            .u16(piece.flags)
            .u32(piece.cost)
            .u16(piece.voxels.len() as u16);
        for &(dx, dy, dz) in &piece.voxels {
            for _ in 0..4 {
                w.u32(piece.sprite);
            }
            for _ in 0..4 {
                w.u32(0);
            }
            w.i8(dx).i8(dy).i8(dz).u8(0);
        }
        w.u32(piece.length);
        for curve in [&piece.car_x, &piece.car_y, &piece.car_z, &piece.car_roll] {
            write_curve(w, curve);
        }
    })
}

pub fn write_car_type(
    rcd: &mut RcdWriter,
    sprite: u32,
    car_length: u32,
    inter_car_length: u32,
    num_passengers: u16,
    num_entrances: u16,
) -> u32 {
    rcd.block(*b"CARS", super::loader::CARS_VERSION, |w| {
        w.u16(TILE_WIDTH)
            .u16(TILE_WIDTH / 4)
            .u32(car_length)
            .u32(inter_car_length)
            .u16(num_passengers)
            .u16(num_entrances);
        for _ in 0..CAR_IMAGE_COUNT {
            w.u32(sprite);
        }
    })
}

pub fn write_platform(rcd: &mut RcdWriter, platform_type: u8, sprite: u32) -> u32 {
    rcd.block(*b"CSPL", super::loader::CSPL_VERSION, |w| {
        w.u16(TILE_WIDTH).u8(platform_type);
        for _ in 0..8 {
            w.u32(sprite);
        }
    })
}

#[allow(clippy::too_many_arguments)]
pub fn write_coaster_type(
    rcd: &mut RcdWriter,
    name: &str,
    coaster_kind: u16,
    platform_type: u8,
    max_number_trains: u8,
    max_number_cars: u8,
    pieces: &[u32],
) -> u32 {
    let mut raw_name = [0u8; super::loader::COASTER_NAME_LENGTH];
    let len = name.len().min(raw_name.len());
    raw_name[..len].copy_from_slice(&name.as_bytes()[..len]);
    rcd.block(*b"RCST", super::loader::RCST_VERSION, |w| {
        w.u16(coaster_kind)
            .u8(platform_type)
            .u8(max_number_trains)
            .u8(max_number_cars)
            .bytes(&raw_name)
            .u16(pieces.len() as u16);
        for &piece in pieces {
            w.u32(piece);
        }
    })
}

/// Pieces of the demo coaster, in coaster-type order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoPiece {
    Straight = 0,
    Station = 1,
    Lift = 2,
    TurnLeft = 3,
}

impl DemoPiece {
    pub fn of(self, coaster_type: &CoasterType) -> Arc<TrackPieceType> {
        Arc::clone(&coaster_type.pieces[self as usize])
    }
}

/// The demo catalog as an RCD file.
pub fn demo_catalog_bytes() -> Vec<u8> {
    let mut rcd = RcdWriter::new();
    let track_sprite = write_sprite(&mut rcd);
    let car_sprite = write_sprite(&mut rcd);
    let platform_sprite = write_sprite(&mut rcd);

    let straight = write_track_piece(&mut rcd, &PieceBlock::straight(track_sprite));
    let station = write_track_piece(
        &mut rcd,
        &PieceBlock {
            // Platform on edge 1.
            flags: TrackFlags::PLATFORM | (1 << 1),
            ..PieceBlock::straight(track_sprite)
        },
    );
    let lift = write_track_piece(
        &mut rcd,
        &PieceBlock {
            speed: 3,
            cost: 250,
            ..PieceBlock::straight(track_sprite)
        },
    );
    let turn = write_track_piece(&mut rcd, &PieceBlock::turn_left(track_sprite));

    write_car_type(
        &mut rcd,
        car_sprite,
        DEMO_CAR_LENGTH,
        DEMO_INTER_CAR_LENGTH,
        4,
        2,
    );
    write_platform(&mut rcd, 1, platform_sprite);
    write_coaster_type(
        &mut rcd,
        DEMO_COASTER_NAME,
        1,
        1,
        4,
        6,
        &[straight, station, lift, turn],
    );
    rcd.finish()
}

/// A catalog holding just the demo coaster.
pub fn demo_catalog() -> Result<Catalog, crate::rcd::RcdError> {
    let mut catalog = Catalog::new();
    super::loader::load_rcd_bytes(&mut catalog, &demo_catalog_bytes())?;
    Ok(catalog)
}
