// ---------------------------------------------------------------------------
// loader – interpret RCD blocks as catalog entries
// ---------------------------------------------------------------------------
//
// Recognised blocks:
//   8PXL (any)  sprite image, referenced by block number
//   TRCK v5     track piece
//   CARS v2     car type
//   CSPL v2     station platform graphics
//   RCST v5     coaster type, referencing TRCK blocks of the same file
//
// A malformed block rejects that entry only; the rest of the file still loads.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bevy::prelude::*;

use crate::coords::Point3;
use crate::rcd::{read_blocks, BlockReader, RcdBlock, RcdError};

use super::registry::Catalog;
use super::track_piece::{
    ConnectionCode, CubicBezier, PieceTypeId, SpriteId, TrackCurve, TrackFlags, TrackPieceType,
    TrackVoxel,
};
use super::types::{
    CarType, CarTypeId, CoasterPlatform, CoasterType, CoasterTypeId, PlatformType,
    CAR_IMAGE_COUNT, COASTER_KIND_COUNT, MAX_TRACK_VOXELS, TILE_WIDTH,
};

pub const TRCK_VERSION: u32 = 5;
pub const CARS_VERSION: u32 = 2;
pub const CSPL_VERSION: u32 = 2;
pub const RCST_VERSION: u32 = 5;

/// Exact payload size of a `CARS` block.
pub const CARS_SIZE: usize = 2 + 2 + 4 + 4 + 2 + 2 + 4 * CAR_IMAGE_COUNT;
/// Exact payload size of a `CSPL` block.
pub const CSPL_SIZE: usize = 2 + 1 + 8 * 4;
/// Length of the zero-padded name field of an `RCST` block.
pub const COASTER_NAME_LENGTH: usize = 16;

const CURVE_FIXED: u8 = 1;
const CURVE_BEZIER: u8 = 2;

/// Outcome of loading one catalog file.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub sprites: usize,
    pub track_pieces: usize,
    pub car_types: usize,
    pub platforms: usize,
    pub coaster_types: usize,
    /// Blocks with a name this loader does not know.
    pub skipped: usize,
    /// Rejected entries: block number, block name and the reason.
    pub rejected: Vec<(u32, [u8; 4], RcdError)>,
}

impl LoadReport {
    pub fn loaded(&self) -> usize {
        self.track_pieces + self.car_types + self.platforms + self.coaster_types
    }
}

/// Block-number lookups valid while loading a single file.
#[derive(Default)]
struct FileRefs {
    sprites: HashMap<u32, SpriteId>,
    pieces: HashMap<u32, Arc<TrackPieceType>>,
}

impl FileRefs {
    fn sprite(&self, field: &'static str, block: u32) -> Result<Option<SpriteId>, RcdError> {
        if block == 0 {
            return Ok(None);
        }
        self.sprites
            .get(&block)
            .copied()
            .map(Some)
            .ok_or(RcdError::DanglingReference { field, block })
    }
}

/// Read a catalog file from disk and register its entries.
///
/// # Errors
///
/// File-level failures only (I/O, bad header, block framing); see
/// [`load_rcd_bytes`].
pub fn load_rcd_file(catalog: &mut Catalog, path: &Path) -> Result<LoadReport, RcdError> {
    let bytes = std::fs::read(path)?;
    let report = load_rcd_bytes(catalog, &bytes)?;
    info!(
        "Loaded catalog {}: {} entries, {} sprites, {} rejected",
        path.display(),
        report.loaded(),
        report.sprites,
        report.rejected.len()
    );
    Ok(report)
}

/// Register every valid entry of an in-memory catalog file.
///
/// # Errors
///
/// Returns an error if the file header or block framing is invalid. Errors in
/// individual blocks are logged and collected in [`LoadReport::rejected`].
pub fn load_rcd_bytes(catalog: &mut Catalog, bytes: &[u8]) -> Result<LoadReport, RcdError> {
    let blocks = read_blocks(bytes)?;
    let mut refs = FileRefs::default();
    let mut report = LoadReport::default();

    for block in &blocks {
        let result = match &block.name {
            b"8PXL" => {
                refs.sprites.insert(block.number, catalog.allocate_sprite());
                report.sprites += 1;
                Ok(())
            }
            b"TRCK" => load_track_piece(block, &refs).map(|piece| {
                let piece = catalog.add_track_piece(piece);
                refs.pieces.insert(block.number, piece);
                report.track_pieces += 1;
            }),
            b"CARS" => load_car_type(block, &refs)
                .and_then(|car| catalog.add_car_type(car))
                .map(|_| report.car_types += 1),
            b"CSPL" => load_platform(block, &refs).map(|platform| {
                catalog.add_platform(platform);
                report.platforms += 1;
            }),
            b"RCST" => load_coaster_type(block, &refs).map(|coaster| {
                catalog.add_coaster_type(coaster);
                report.coaster_types += 1;
            }),
            _ => {
                report.skipped += 1;
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(
                "Rejecting {} block #{}: {e}",
                crate::rcd::block_name(&block.name),
                block.number
            );
            report.rejected.push((block.number, block.name, e));
        }
    }
    Ok(report)
}

fn check_range(field: &'static str, value: i64, ok: bool) -> Result<(), RcdError> {
    if ok {
        Ok(())
    } else {
        Err(RcdError::FieldRange { field, value })
    }
}

fn read_curve(r: &mut BlockReader<'_>, length: u32) -> Result<TrackCurve, RcdError> {
    match r.u8()? {
        CURVE_FIXED => Ok(TrackCurve::Fixed(f64::from(r.f32()?))),
        CURVE_BEZIER => {
            let count = r.u8()?;
            check_range("curve segment count", i64::from(count), count > 0)?;
            let mut segments = Vec::with_capacity(count as usize);
            let mut expected_start = 0;
            for _ in 0..count {
                let start = r.u32()?;
                let last = r.u32()?;
                check_range(
                    "curve segment start",
                    i64::from(start),
                    start == expected_start,
                )?;
                check_range(
                    "curve segment end",
                    i64::from(last),
                    last >= start && last <= length,
                )?;
                segments.push(CubicBezier {
                    start,
                    last,
                    a: f64::from(r.f32()?),
                    b: f64::from(r.f32()?),
                    c: f64::from(r.f32()?),
                    d: f64::from(r.f32()?),
                });
                expected_start = last;
            }
            check_range("curve end", i64::from(expected_start), expected_start == length)?;
            Ok(TrackCurve::Bezier(segments))
        }
        tag => Err(RcdError::FieldRange {
            field: "curve type",
            value: i64::from(tag),
        }),
    }
}

fn read_sprites<const N: usize>(
    r: &mut BlockReader<'_>,
    refs: &FileRefs,
    field: &'static str,
) -> Result<[Option<SpriteId>; N], RcdError> {
    let mut out = [None; N];
    for slot in &mut out {
        *slot = refs.sprite(field, r.u32()?)?;
    }
    Ok(out)
}

fn load_track_piece(block: &RcdBlock<'_>, refs: &FileRefs) -> Result<TrackPieceType, RcdError> {
    block.expect_version(TRCK_VERSION)?;
    let mut r = block.reader();

    let entry = ConnectionCode(r.u8()?);
    let exit = ConnectionCode(r.u8()?);
    let exit_offset = Point3::new(
        i32::from(r.i8()?),
        i32::from(r.i8()?),
        i32::from(r.i8()?),
    );
    let speed = r.u8()?;
    let flags = TrackFlags(r.u16()?);
    let cost = r.u32()?;

    let voxel_count = r.u16()?;
    check_range("voxel count", i64::from(voxel_count), voxel_count > 0)?;
    let mut voxels = Vec::with_capacity(voxel_count as usize);
    for _ in 0..voxel_count {
        let back = read_sprites::<4>(&mut r, refs, "track back sprite")?;
        let front = read_sprites::<4>(&mut r, refs, "track front sprite")?;
        let offset = Point3::new(
            i32::from(r.i8()?),
            i32::from(r.i8()?),
            i32::from(r.i8()?),
        );
        let space = r.u8()?;
        voxels.push(TrackVoxel {
            offset,
            back,
            front,
            space,
            has_platform: flags.has_platform(),
            platform_direction: flags.platform_direction(),
            is_powered: speed > 0,
        });
    }

    let length = r.u32()?;
    check_range("piece length", i64::from(length), length > 0)?;
    let car_x = read_curve(&mut r, length)?;
    let car_y = read_curve(&mut r, length)?;
    let car_z = read_curve(&mut r, length)?;
    let car_roll = read_curve(&mut r, length)?;
    r.finish()?;

    Ok(TrackPieceType {
        id: PieceTypeId(0),
        entry,
        exit,
        exit_offset,
        speed,
        flags,
        cost,
        voxels,
        length,
        car_x,
        car_y,
        car_z,
        car_roll,
    })
}

fn load_car_type(block: &RcdBlock<'_>, refs: &FileRefs) -> Result<CarType, RcdError> {
    block.expect_version(CARS_VERSION)?;
    block.expect_size(CARS_SIZE)?;
    let mut r = block.reader();

    let tile_width = r.u16()?;
    check_range("tile width", i64::from(tile_width), tile_width == TILE_WIDTH)?;
    let z_height = r.u16()?;
    check_range("z height", i64::from(z_height), z_height == tile_width / 4)?;
    let car_length = r.u32()?;
    check_range("car length", i64::from(car_length), car_length <= 65535)?;
    let inter_car_length = r.u32()?;
    let num_passengers = r.u16()?;
    let num_entrances = r.u16()?;
    check_range(
        "number of entrances",
        i64::from(num_entrances),
        (1..=4).contains(&num_entrances) && num_passengers % num_entrances.max(1) == 0,
    )?;

    let mut cars = Vec::with_capacity(CAR_IMAGE_COUNT);
    for _ in 0..CAR_IMAGE_COUNT {
        cars.push(refs.sprite("car sprite", r.u32()?)?);
    }
    r.finish()?;

    Ok(CarType {
        id: CarTypeId(0),
        tile_width,
        z_height,
        car_length,
        inter_car_length,
        num_passengers,
        num_entrances,
        cars,
    })
}

fn load_platform(block: &RcdBlock<'_>, refs: &FileRefs) -> Result<CoasterPlatform, RcdError> {
    block.expect_version(CSPL_VERSION)?;
    block.expect_size(CSPL_SIZE)?;
    let mut r = block.reader();

    let tile_width = r.u16()?;
    check_range("tile width", i64::from(tile_width), tile_width == TILE_WIDTH)?;
    let platform_type = r.u8()?;
    check_range(
        "platform type",
        i64::from(platform_type),
        platform_type < PlatformType::COUNT,
    )?;
    let raw = read_sprites::<8>(&mut r, refs, "platform sprite")?;
    r.finish()?;

    Ok(CoasterPlatform {
        tile_width,
        platform_type: PlatformType(platform_type),
        sprites: [
            (raw[0], raw[1]),
            (raw[2], raw[3]),
            (raw[4], raw[5]),
            (raw[6], raw[7]),
        ],
    })
}

fn load_coaster_type(block: &RcdBlock<'_>, refs: &FileRefs) -> Result<CoasterType, RcdError> {
    block.expect_version(RCST_VERSION)?;
    let mut r = block.reader();

    let coaster_kind = r.u16()?;
    check_range(
        "coaster kind",
        i64::from(coaster_kind),
        coaster_kind > 0 && coaster_kind < COASTER_KIND_COUNT,
    )?;
    let platform_type = r.u8()?;
    check_range(
        "platform type",
        i64::from(platform_type),
        platform_type > 0 && platform_type < PlatformType::COUNT,
    )?;
    let max_number_trains = r.u8()?;
    check_range("max trains", i64::from(max_number_trains), max_number_trains > 0)?;
    let max_number_cars = r.u8()?;
    check_range("max cars", i64::from(max_number_cars), max_number_cars > 0)?;

    let raw_name = r.bytes(COASTER_NAME_LENGTH)?;
    let end = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
    let name = String::from_utf8_lossy(&raw_name[..end]).into_owned();

    let piece_count = r.u16()?;
    if r.remaining() != 4 * piece_count as usize {
        return Err(RcdError::SizeMismatch {
            name: block.name,
            expected: block.payload.len() - r.remaining() + 4 * piece_count as usize,
            found: block.payload.len(),
        });
    }
    let mut pieces = Vec::with_capacity(piece_count as usize);
    for _ in 0..piece_count {
        let number = r.u32()?;
        let piece = refs
            .pieces
            .get(&number)
            .ok_or(RcdError::DanglingReference {
                field: "coaster track piece",
                block: number,
            })?;
        pieces.push(Arc::clone(piece));
    }
    r.finish()?;

    let track_voxels: usize = pieces.iter().map(|p| p.voxels.len()).sum();
    check_range(
        "track voxels",
        track_voxels as i64,
        track_voxels <= MAX_TRACK_VOXELS,
    )?;

    Ok(CoasterType::new(
        CoasterTypeId(0),
        coaster_kind,
        PlatformType(platform_type),
        max_number_trains,
        max_number_cars,
        name,
        pieces,
    ))
}
