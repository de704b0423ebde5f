//! Integration tests for the coaster core using the `TestPark` harness.
//!
//! These tests spin up a headless Bevy App with `CoasterSimPlugin` and check
//! the systems working together across fixed ticks.

use crate::coaster::{
    BreakdownState, LayoutError, ParkLayout, RideNotification, RideState, RideStats,
};
use crate::config::MIN_CRAWL_SPEED;
use crate::coords::Point3;
use crate::test_harness::{oval_ride_layout, TestPark};
use crate::voxel_world::VoxelInstance;

const ORIGIN: Point3 = Point3::new(20, 20, 3);

// ===========================================================================
// 1. Harness bootstrap
// ===========================================================================

#[test]
fn empty_park_has_no_rides() {
    let park = TestPark::new();
    assert!(park.rides().is_empty());
    assert_eq!(park.voxels().voxel_count(), 0);
}

#[test]
fn ticks_advance_the_counter() {
    let mut park = TestPark::new();
    let before = park.ticks();
    park.tick(5);
    assert_eq!(park.ticks(), before + 5);
}

#[test]
fn empty_park_ticks_without_stats() {
    let mut park = TestPark::new();
    park.tick(3);
    assert_eq!(*park.resource::<RideStats>(), RideStats::default());
}

// ===========================================================================
// 2. Building and running
// ===========================================================================

#[test]
fn demo_oval_starts_testing_with_one_train() {
    let mut park = TestPark::new();
    let id = park.with_demo_oval(ORIGIN, 3);

    let ride = park.ride(id);
    assert_eq!(ride.state(), RideState::Testing);
    assert_eq!(ride.trains().len(), 1);
    assert_eq!(ride.trains()[0].cars.len(), 1);
    assert!(matches!(
        park.voxels().instance_at(ORIGIN),
        VoxelInstance::Ride { ride, .. } if ride == id
    ));
}

#[test]
fn ticks_move_trains() {
    let mut park = TestPark::new();
    let id = park.with_demo_oval(ORIGIN, 3);
    let start = park.ride(id).trains()[0].back_position;

    park.tick(10);

    let train = &park.ride(id).trains()[0];
    assert_ne!(train.back_position, start, "train should leave the station");
    assert!(
        train.speed >= MIN_CRAWL_SPEED,
        "flat oval keeps at least crawl speed, got {}",
        train.speed
    );
    let car = &train.cars[0];
    assert!(car.back.pose().is_some());
    assert!(car.front.pose().is_some());
}

#[test]
fn trains_keep_lapping() {
    let mut park = TestPark::new();
    let id = park.with_demo_oval(ORIGIN, 2);
    let length = park.ride(id).track().map(|t| t.length()).unwrap();

    park.tick(500);

    let train = &park.ride(id).trains()[0];
    assert!(train.back_position < length);
    assert!(train.cur_piece < park.ride(id).track().unwrap().len());
}

#[test]
fn ride_stats_follow_rides() {
    let mut park = TestPark::new();
    let id = park.with_demo_oval(ORIGIN, 3);
    park.with_rides(|rides, world| {
        let ride = rides.get_mut(id).unwrap();
        ride.set_number_of_cars(2, world);
        ride.set_number_of_trains(2, world);
    });
    park.tick(1);

    let stats = park.resource::<RideStats>().clone();
    assert_eq!(stats.rides, 1);
    assert_eq!(stats.testing, 1);
    assert_eq!(stats.open, 0);
    assert_eq!(stats.trains_running, 2);
    assert_eq!(stats.cars_running, 4);
}

#[test]
fn state_changes_are_sent_as_events() {
    let mut park = TestPark::new();
    let id = park.with_demo_oval(ORIGIN, 2);
    park.tick(1);

    let events = park.notifications();
    assert!(events.contains(&RideNotification::StateChanged {
        ride: id,
        from: RideState::Building,
        to: RideState::Testing,
    }));
    assert!(events.contains(&RideNotification::TrainsAllocated {
        ride: id,
        trains: 1,
        cars: 1,
    }));
}

// ===========================================================================
// 3. Days and breakdowns
// ===========================================================================

#[test]
fn open_ride_breaks_down_when_countdown_runs_out() {
    let mut park = TestPark::new().with_seed(7);
    let id = park.with_demo_oval(ORIGIN, 2);
    park.open_ride(id);

    let BreakdownState::WillBreak { days } = park.ride(id).breakdown() else {
        panic!("opening should start the countdown");
    };
    assert!(days >= 30, "first countdown includes the grace period");

    park.advance_days(days as u32 - 1);
    assert!(matches!(
        park.ride(id).breakdown(),
        BreakdownState::WillBreak { days: 1 }
    ));

    park.advance_days(1);
    assert_eq!(park.ride(id).breakdown(), BreakdownState::Broken);
    assert!(park
        .notifications()
        .contains(&RideNotification::BrokenDown { ride: id }));
    assert_eq!(park.resource::<RideStats>().broken, 1);
}

#[test]
fn testing_ride_ignores_new_days() {
    let mut park = TestPark::new();
    let id = park.with_demo_oval(ORIGIN, 2);
    park.advance_days(10);
    assert_eq!(park.ride(id).breakdown(), BreakdownState::Unopened);
}

// ===========================================================================
// 4. Layouts
// ===========================================================================

#[test]
fn layout_builds_and_opens_ride() {
    let mut park = TestPark::new();
    let layout = ParkLayout {
        rides: vec![oval_ride_layout(ORIGIN, 3, 2, 3, true)],
    };
    let ids = park.with_layout(&layout).unwrap();
    assert_eq!(ids.len(), 1);

    let ride = park.ride(ids[0]);
    assert_eq!(ride.state(), RideState::Open);
    assert_eq!(ride.trains().len(), 2);
    assert!(ride.trains().iter().all(|t| t.cars.len() == 3));
}

#[test]
fn broken_layout_leaves_nothing_behind() {
    let mut park = TestPark::new();
    let mut ride = oval_ride_layout(ORIGIN, 3, 1, 1, false);
    ride.pieces.pop();
    let layout = ParkLayout { rides: vec![ride] };

    let err = park.with_layout(&layout).unwrap_err();
    assert!(matches!(err, LayoutError::NotALoop(_)), "got {err}");
    assert!(park.rides().is_empty());
    assert!(park.voxels().can_place_instance(ORIGIN));
}

#[test]
fn layout_rejects_too_many_trains() {
    let mut park = TestPark::new();
    let layout = ParkLayout {
        rides: vec![oval_ride_layout(ORIGIN, 3, 9, 1, false)],
    };
    assert!(matches!(
        park.with_layout(&layout),
        Err(LayoutError::Capacity { trains: 9, .. })
    ));
    assert!(park.rides().is_empty());
}

#[test]
fn layout_rejects_unknown_coaster_type() {
    let mut park = TestPark::new();
    let mut ride = oval_ride_layout(ORIGIN, 2, 1, 1, false);
    ride.coaster_type = "Wooden Wonder".to_string();
    let layout = ParkLayout { rides: vec![ride] };
    assert!(matches!(
        park.with_layout(&layout),
        Err(LayoutError::UnknownCoasterType(name)) if name == "Wooden Wonder"
    ));
}

// ===========================================================================
// 5. Save and load
// ===========================================================================

#[test]
fn save_and_load_rebuilds_rides() {
    let mut park = TestPark::new();
    let layout = ParkLayout {
        rides: vec![oval_ride_layout(ORIGIN, 3, 2, 2, true)],
    };
    let id = park.with_layout(&layout).unwrap()[0];
    park.tick(25);
    let name = park.ride(id).name().to_string();
    let breakdown = park.ride(id).breakdown();
    let save = park.save();
    assert!(save.contains_key("coaster_rides"));

    let mut loaded = TestPark::new();
    loaded.load(&save);
    assert!(loaded.rides().is_empty(), "rides are rebuilt on the next tick");
    loaded.tick(1);

    let ride = loaded.ride(id);
    assert_eq!(ride.name(), name);
    assert_eq!(ride.state(), RideState::Open);
    assert_eq!(ride.breakdown(), breakdown);
    assert_eq!(ride.trains().len(), 2);
    assert!(ride.trains().iter().all(|t| t.cars.len() == 2));
    assert!(matches!(
        loaded.voxels().instance_at(ORIGIN),
        VoxelInstance::Ride { ride, .. } if ride == id
    ));
}

#[test]
fn loading_replaces_existing_rides() {
    let mut source = TestPark::new();
    let saved = source.with_demo_oval(ORIGIN, 2);
    let save = source.save();

    let mut park = TestPark::new();
    let other_origin = Point3::new(60, 60, 3);
    park.with_demo_oval(other_origin, 4);
    park.load(&save);
    park.tick(1);

    assert_eq!(park.rides().len(), 1);
    assert!(park.rides().get(saved).is_some());
    assert!(park.voxels().can_place_instance(other_origin));
}

#[test]
fn empty_park_saves_only_the_rng() {
    let mut park = TestPark::new();
    let save = park.save();
    assert!(!save.contains_key("coaster_rides"));
    assert!(save.contains_key("sim_rng"));
}
