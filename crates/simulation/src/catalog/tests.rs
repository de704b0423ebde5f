use super::demo::*;
use super::*;
use crate::coords::Orientation;
use crate::rcd::{RcdError, RcdWriter};

fn load(bytes: &[u8]) -> (Catalog, LoadReport) {
    let mut catalog = Catalog::new();
    let report = load_rcd_bytes(&mut catalog, bytes).expect("file should frame correctly");
    (catalog, report)
}

// ====================================================================
// Demo catalog
// ====================================================================

#[test]
fn test_demo_catalog_loads_everything() {
    let (catalog, report) = load(&demo_catalog_bytes());
    assert!(report.rejected.is_empty(), "rejected: {:?}", report.rejected);
    assert_eq!(report.sprites, 3);
    assert_eq!(report.track_pieces, 4);
    assert_eq!(report.car_types, 1);
    assert_eq!(report.platforms, 1);
    assert_eq!(report.coaster_types, 1);
    assert_eq!(report.loaded(), 7);

    let coaster = catalog
        .coaster_type_by_name(DEMO_COASTER_NAME)
        .expect("demo coaster registered");
    assert_eq!(coaster.pieces.len(), 4);
    assert_eq!(coaster.max_number_trains, 4);
    assert_eq!(coaster.max_number_cars, 6);
    assert_eq!(coaster.platform_type, PlatformType::WOOD);
    assert!(catalog.can_make_instance(coaster));
    assert!(catalog.platform(PlatformType::WOOD).is_some());
}

#[test]
fn test_demo_piece_properties() {
    let catalog = demo_catalog().unwrap();
    let coaster = catalog.coaster_type_by_name(DEMO_COASTER_NAME).unwrap();

    let station = DemoPiece::Station.of(coaster);
    assert!(station.has_platform());
    assert_eq!(station.flags.platform_direction(), 1);
    assert!(!station.has_power());

    let lift = DemoPiece::Lift.of(coaster);
    assert!(lift.has_power());
    assert!(lift.voxels.iter().all(|v| v.is_powered));

    let turn = DemoPiece::TurnLeft.of(coaster);
    assert_eq!(turn.length, TURN_LENGTH);
    let (x0, y0, _) = turn.position(0);
    let (x1, y1, _) = turn.position(TURN_LENGTH);
    assert!((x0 - 0.0).abs() < 1e-3 && (y0 - 128.0).abs() < 1e-3);
    assert!((x1 - 128.0).abs() < 1e-3 && (y1 - 256.0).abs() < 1e-3);
}

#[test]
fn test_track_voxel_index_is_flattened() {
    let catalog = demo_catalog().unwrap();
    let coaster = catalog.coaster_type_by_name(DEMO_COASTER_NAME).unwrap();
    assert_eq!(coaster.track_voxel_count(), 4);
    let lift = DemoPiece::Lift.of(coaster);
    assert_eq!(coaster.track_voxel_index(lift.id, 0), Some(2));
    assert_eq!(coaster.track_voxel_index(lift.id, 1), None);
    assert!(coaster.track_voxel(2).unwrap().is_powered);
    assert!(coaster.track_voxel(9).is_none());
}

// ====================================================================
// Block validation
// ====================================================================

#[test]
fn test_unknown_blocks_are_skipped() {
    let mut rcd = RcdWriter::new();
    rcd.block(*b"SHOP", 4, |w| {
        w.u32(1);
    });
    let (_, report) = load(&rcd.finish());
    assert_eq!(report.skipped, 1);
    assert_eq!(report.loaded(), 0);
}

#[test]
fn test_car_type_with_wrong_version_rejected() {
    let mut rcd = RcdWriter::new();
    rcd.block(*b"CARS", 1, |w| {
        w.u16(64);
    });
    let (catalog, report) = load(&rcd.finish());
    assert_eq!(catalog.car_type_count(), 0);
    assert!(matches!(
        report.rejected[0].2,
        RcdError::VersionMismatch {
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn test_car_type_with_wrong_size_rejected() {
    let mut rcd = RcdWriter::new();
    rcd.block(*b"CARS", 2, |w| {
        w.u16(64).u16(16);
    });
    let (_, report) = load(&rcd.finish());
    assert!(matches!(
        report.rejected[0].2,
        RcdError::SizeMismatch { found: 4, .. }
    ));
}

#[test]
fn test_car_type_field_ranges() {
    // Passengers not divisible by the number of rows.
    let mut rcd = RcdWriter::new();
    let sprite = write_sprite(&mut rcd);
    write_car_type(&mut rcd, sprite, 1000, 100, 5, 2);
    // Too many rows.
    write_car_type(&mut rcd, sprite, 1000, 100, 10, 5);
    // Car longer than a voxel.
    write_car_type(&mut rcd, sprite, 70000, 100, 4, 2);
    let (catalog, report) = load(&rcd.finish());

    assert_eq!(catalog.car_type_count(), 0);
    assert_eq!(report.rejected.len(), 3);
    assert!(report
        .rejected
        .iter()
        .all(|(_, name, e)| name == b"CARS" && matches!(e, RcdError::FieldRange { .. })));
}

#[test]
fn test_dangling_sprite_reference_rejects_piece() {
    let mut rcd = RcdWriter::new();
    // Block 1 is a track piece, so reference 1 is not a sprite.
    write_track_piece(&mut rcd, &PieceBlock::straight(1));
    let (catalog, report) = load(&rcd.finish());
    assert_eq!(catalog.track_piece_count(), 0);
    assert!(matches!(
        report.rejected[0].2,
        RcdError::DanglingReference { block: 1, .. }
    ));
}

#[test]
fn test_piece_without_sprites_is_valid() {
    let mut rcd = RcdWriter::new();
    write_track_piece(&mut rcd, &PieceBlock::straight(0));
    let (catalog, report) = load(&rcd.finish());
    assert!(report.rejected.is_empty());
    let piece = catalog.track_piece(PieceTypeId(1)).unwrap();
    assert_eq!(piece.voxels[0].back, [None; 4]);
}

#[test]
fn test_curve_must_cover_piece() {
    let mut rcd = RcdWriter::new();
    let short = PieceBlock {
        car_x: CurveBlock::linear(STRAIGHT_LENGTH / 2, 0.0, 256.0),
        ..PieceBlock::straight(0)
    };
    write_track_piece(&mut rcd, &short);
    let (catalog, report) = load(&rcd.finish());
    assert_eq!(catalog.track_piece_count(), 0);
    assert!(matches!(
        report.rejected[0].2,
        RcdError::FieldRange {
            field: "curve end",
            ..
        }
    ));
}

#[test]
fn test_coaster_type_requires_pieces_from_same_file() {
    let mut rcd = RcdWriter::new();
    let piece = write_track_piece(&mut rcd, &PieceBlock::straight(0));
    write_coaster_type(&mut rcd, "Good", 1, 1, 2, 3, &[piece]);
    write_coaster_type(&mut rcd, "Dangling", 1, 1, 2, 3, &[piece, 42]);
    write_coaster_type(&mut rcd, "Missing", 1, 1, 2, 3, &[0]);
    write_coaster_type(&mut rcd, "BadKind", 7, 1, 2, 3, &[piece]);
    let (catalog, report) = load(&rcd.finish());

    assert_eq!(report.coaster_types, 1);
    assert_eq!(report.rejected.len(), 3);
    assert!(catalog.coaster_type_by_name("Good").is_some());
    assert!(catalog.coaster_type_by_name("Dangling").is_none());
}

#[test]
fn test_coaster_type_piece_count_must_match_size() {
    let mut rcd = RcdWriter::new();
    rcd.block(*b"RCST", 5, |w| {
        w.u16(1).u8(1).u8(1).u8(1).bytes(&[0; 16]).u16(3).u32(0);
    });
    let (_, report) = load(&rcd.finish());
    assert!(matches!(
        report.rejected[0].2,
        RcdError::SizeMismatch {
            expected: 35,
            found: 27,
            ..
        }
    ));
}

#[test]
fn test_coaster_type_track_voxels_fit_instance_data() {
    let mut rcd = RcdWriter::new();
    let piece = write_track_piece(&mut rcd, &PieceBlock::straight(0));
    write_coaster_type(&mut rcd, "Largest", 1, 1, 2, 3, &vec![piece; MAX_TRACK_VOXELS]);
    write_coaster_type(&mut rcd, "Too Large", 1, 1, 2, 3, &vec![piece; MAX_TRACK_VOXELS + 1]);
    let (catalog, report) = load(&rcd.finish());

    assert_eq!(report.coaster_types, 1);
    assert!(catalog.coaster_type_by_name("Largest").is_some());
    assert!(catalog.coaster_type_by_name("Too Large").is_none());
    assert!(matches!(
        report.rejected[0].2,
        RcdError::FieldRange {
            field: "track voxels",
            value: 16385,
        }
    ));
}

#[test]
fn test_platform_type_out_of_range_rejected() {
    let mut rcd = RcdWriter::new();
    write_platform(&mut rcd, PlatformType::COUNT, 0);
    let (catalog, report) = load(&rcd.finish());
    assert!(catalog.platform(PlatformType(PlatformType::COUNT)).is_none());
    assert!(matches!(
        report.rejected[0].2,
        RcdError::FieldRange {
            field: "platform type",
            ..
        }
    ));
}

#[test]
fn test_bad_file_rejects_everything() {
    let mut catalog = Catalog::new();
    let err = load_rcd_bytes(&mut catalog, b"RCD").unwrap_err();
    assert!(err.is_file_level());
    assert_eq!(catalog.sprite_count(), 0);
}

// ====================================================================
// Registry
// ====================================================================

#[test]
fn test_car_type_table_is_bounded() {
    let mut rcd = RcdWriter::new();
    for _ in 0..crate::config::MAX_CAR_TYPES + 1 {
        write_car_type(&mut rcd, 0, 1000, 100, 2, 1);
    }
    let (catalog, report) = load(&rcd.finish());
    assert_eq!(catalog.car_type_count(), crate::config::MAX_CAR_TYPES);
    assert!(matches!(
        report.rejected[0].2,
        RcdError::TableFull { capacity: 16, .. }
    ));
}

#[test]
fn test_default_car_type_is_first_registered() {
    let mut rcd = RcdWriter::new();
    write_car_type(&mut rcd, 0, 1000, 100, 2, 1);
    write_car_type(&mut rcd, 0, 2000, 100, 2, 1);
    let (catalog, _) = load(&rcd.finish());
    assert_eq!(catalog.default_car_type().unwrap().car_length, 1000);
    assert_eq!(catalog.default_car_type().unwrap().id, CarTypeId(0));
}

#[test]
fn test_no_instance_without_car_type() {
    let mut rcd = RcdWriter::new();
    let piece = write_track_piece(&mut rcd, &PieceBlock::straight(0));
    write_coaster_type(&mut rcd, "Lonely", 1, 1, 1, 1, &[piece]);
    let (catalog, _) = load(&rcd.finish());
    let coaster = catalog.coaster_type_by_name("Lonely").unwrap();
    assert!(!catalog.can_make_instance(coaster));
}

#[test]
fn test_sprite_ids_are_catalog_wide() {
    let mut catalog = Catalog::new();
    load_rcd_bytes(&mut catalog, &demo_catalog_bytes()).unwrap();
    load_rcd_bytes(&mut catalog, &demo_catalog_bytes()).unwrap();
    assert_eq!(catalog.sprite_count(), 6);
    assert_eq!(catalog.track_piece_count(), 8);
    // The second file's pieces reference the second file's sprites.
    let second = catalog.track_piece(PieceTypeId(5)).unwrap();
    assert_eq!(second.voxels[0].back[0], Some(SpriteId(4)));
}

// ====================================================================
// Track piece helpers
// ====================================================================

#[test]
fn test_track_flags_decode() {
    let flags = TrackFlags(0b0011_1101_1011_1011);
    assert!(flags.has_platform());
    assert_eq!(flags.platform_direction(), 1);
    assert!(flags.is_initial());
    assert_eq!(flags.initial_direction(), 3);
    assert_eq!(flags.banking(), 2);
    assert_eq!(flags.slope(), -3);
    assert_eq!(flags.bend(), -1);
}

#[test]
fn test_connection_code_rotation() {
    let code = ConnectionCode(FLAT | 3);
    assert_eq!(code.rotated(Orientation::North), code);
    assert_eq!(code.rotated(Orientation::East), ConnectionCode(FLAT));
    assert_eq!(code.rotated(Orientation::South).profile(), code.profile());
    assert!(code.joins(ConnectionCode(FLAT | 3)));
    assert!(!code.joins(ConnectionCode(FLAT | 1)));
}

#[test]
fn test_piecewise_curve_picks_segment() {
    let curve = TrackCurve::Bezier(vec![
        CubicBezier::linear(0, 100, 0.0, 10.0),
        CubicBezier::linear(100, 200, 10.0, 30.0),
    ]);
    assert!((curve.value(50.0) - 5.0).abs() < 1e-9);
    assert!((curve.value(100.0) - 10.0).abs() < 1e-9);
    assert!((curve.value(150.0) - 20.0).abs() < 1e-9);
    assert!((curve.value(200.0) - 30.0).abs() < 1e-9);
    assert_eq!(TrackCurve::Fixed(4.5).value(1e6), 4.5);
}
