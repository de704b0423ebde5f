//! Public-API tests: load the demo catalog, build rides from JSON layouts and
//! run their trains without a Bevy app.
//!
//! Run: cargo test -p coaster_sim --test loop_assembly

use coaster_sim::catalog::demo::{demo_catalog, demo_catalog_bytes, DEMO_COASTER_NAME};
use coaster_sim::catalog::{load_rcd_file, Catalog};
use coaster_sim::coaster::{LayoutError, ParkLayout, RideState, RidesManager};
use coaster_sim::coords::{Orientation, Point3};
use coaster_sim::sim_rng::SimRng;
use coaster_sim::voxel_world::{VoxelInstance, VoxelWorld};

const OVAL_JSON: &str = r#"{
  "rides": [
    {
      "coaster_type": "Demo Coaster",
      "trains": 2,
      "cars": 2,
      "pieces": [
        { "piece": 1, "voxel": { "x": 10, "y": 10, "z": 2 } },
        { "piece": 0, "voxel": { "x": 11, "y": 10, "z": 2 } },
        { "piece": 3, "voxel": { "x": 12, "y": 10, "z": 2 } },
        { "piece": 3, "voxel": { "x": 12, "y": 11, "z": 2 }, "orientation": "East" },
        { "piece": 2, "voxel": { "x": 11, "y": 11, "z": 2 }, "orientation": "South" },
        { "piece": 0, "voxel": { "x": 10, "y": 11, "z": 2 }, "orientation": "South" },
        { "piece": 3, "voxel": { "x": 9, "y": 11, "z": 2 }, "orientation": "South" },
        { "piece": 3, "voxel": { "x": 9, "y": 10, "z": 2 }, "orientation": "West" }
      ]
    }
  ]
}"#;

struct Park {
    catalog: Catalog,
    world: VoxelWorld,
    rides: RidesManager,
    rng: SimRng,
}

impl Park {
    fn new() -> Self {
        Self {
            catalog: demo_catalog().expect("demo catalog loads"),
            world: VoxelWorld::default(),
            rides: RidesManager::default(),
            rng: SimRng::from_seed_u64(1),
        }
    }

    fn build(&mut self, layout: &ParkLayout) -> Result<Vec<coaster_sim::voxel_world::RideId>, LayoutError> {
        self.rides
            .build_park(layout, &self.catalog, &mut self.world, &mut self.rng)
    }
}

fn oval() -> ParkLayout {
    serde_json::from_str(OVAL_JSON).expect("layout parses")
}

// ---------------------------------------------------------------------------
// 1. Layout parsing
// ---------------------------------------------------------------------------

#[test]
fn test_layout_defaults() {
    let layout = oval();
    let ride = &layout.rides[0];
    assert!(!ride.open);
    assert_eq!(ride.pieces[0].orientation, Orientation::North);
    assert_eq!(ride.pieces[4].orientation, Orientation::South);

    let minimal: ParkLayout =
        serde_json::from_str(r#"{ "rides": [ { "coaster_type": "X", "pieces": [] } ] }"#).unwrap();
    assert_eq!(minimal.rides[0].trains, 1);
    assert_eq!(minimal.rides[0].cars, 1);
}

#[test]
fn test_layout_survives_json() {
    let layout = oval();
    let text = serde_json::to_string(&layout).unwrap();
    let back: ParkLayout = serde_json::from_str(&text).unwrap();
    assert_eq!(back, layout);
}

// ---------------------------------------------------------------------------
// 2. Loop assembly through the public API
// ---------------------------------------------------------------------------

#[test]
fn test_oval_assembles_in_placement_order() {
    let mut park = Park::new();
    let id = park.build(&oval()).unwrap()[0];
    let ride = park.rides.get(id).unwrap();
    assert_eq!(ride.state(), RideState::Testing);

    let coaster = park.catalog.coaster_type_by_name(DEMO_COASTER_NAME).unwrap();
    let expected: u32 = [1, 0, 3, 3, 2, 0, 3, 3]
        .iter()
        .map(|&i| coaster.pieces[i].length)
        .sum();
    let track = ride.track().unwrap();
    assert_eq!(track.length(), expected);
    assert_eq!(track.len(), 8);
    assert_eq!(track.piece(0).base_voxel, Point3::new(10, 10, 2));
    assert_eq!(track.piece(0).distance_base, 0);
    for pair in track.pieces().windows(2) {
        assert_eq!(pair[1].distance_base, pair[0].end_distance());
        assert!(pair[1].can_be_successor(&pair[0]));
    }
}

#[test]
fn test_shuffled_placement_still_closes() {
    let mut layout = oval();
    layout.rides[0].pieces[1..].reverse();
    let mut park = Park::new();
    let id = park.build(&layout).unwrap()[0];
    let track = park.rides.get(id).unwrap().track().unwrap();
    assert_eq!(track.len(), 8);
    assert_eq!(track.piece(0).base_voxel, Point3::new(10, 10, 2));
    assert_eq!(track.piece(1).base_voxel, Point3::new(11, 10, 2));
}

#[test]
fn test_trains_spread_over_loop() {
    let mut park = Park::new();
    let id = park.build(&oval()).unwrap()[0];
    let ride = park.rides.get(id).unwrap();
    let length = ride.track().unwrap().length();
    let positions: Vec<u32> = ride.trains().iter().map(|t| t.back_position).collect();
    assert_eq!(positions, vec![0, length / 2]);
}

#[test]
fn test_overlapping_rides_are_rejected() {
    let mut park = Park::new();
    park.build(&oval()).unwrap();
    let err = park.build(&oval()).unwrap_err();
    assert!(matches!(err, LayoutError::Placement(_)), "got {err}");
    assert_eq!(park.rides.len(), 1);
}

#[test]
fn test_unknown_piece_index() {
    let mut layout = oval();
    layout.rides[0].pieces[2].piece = 40;
    let mut park = Park::new();
    assert!(matches!(
        park.build(&layout),
        Err(LayoutError::UnknownPiece { index: 40, .. })
    ));
    assert!(park.rides.is_empty());
    assert_eq!(park.world.instance_at(Point3::new(10, 10, 2)), VoxelInstance::Free);
}

// ---------------------------------------------------------------------------
// 3. Running trains
// ---------------------------------------------------------------------------

#[test]
fn test_trains_run_many_laps() {
    let mut park = Park::new();
    let id = park.build(&oval()).unwrap()[0];
    for _ in 0..2_000 {
        park.rides.on_animate(100, &mut park.world);
    }
    let ride = park.rides.get(id).unwrap();
    let track = ride.track().unwrap();
    for train in ride.trains() {
        assert!(train.back_position < track.length());
        assert!(track.piece(train.cur_piece).contains(train.back_position));
        for car in &train.cars {
            let pose = car.front.pose().expect("running cars are drawn");
            let voxel = park.world.get(pose.voxel).expect("car voxel exists");
            assert!(voxel.car_ends.iter().any(|end| end.ride == id));
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Catalog files
// ---------------------------------------------------------------------------

#[test]
fn test_catalog_loads_from_file() {
    let path = std::env::temp_dir().join(format!("coaster_sim_demo_{}.rcd", std::process::id()));
    std::fs::write(&path, demo_catalog_bytes()).unwrap();

    let mut catalog = Catalog::new();
    let report = load_rcd_file(&mut catalog, &path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(report.rejected.is_empty());
    assert_eq!(report.coaster_types, 1);
    assert_eq!(report.track_pieces, 4);
    assert!(catalog.coaster_type_by_name(DEMO_COASTER_NAME).is_some());
}
