//! # TestPark: headless test harness for the coaster core
//!
//! Wraps `bevy::app::App` + `CoasterSimPlugin` with the demo catalog loaded,
//! plus builders for track layouts used across the tests and benches.

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::app::App;
use bevy::prelude::*;

use crate::catalog::demo::{demo_catalog, DemoPiece, DEMO_COASTER_NAME};
use crate::catalog::{
    Catalog, ConnectionCode, CoasterType, PieceTypeId, TrackCurve, TrackFlags, TrackPieceType,
    TrackVoxel,
};
use crate::coaster::{
    CoasterInstance, LayoutError, NewDay, ParkLayout, PieceLayout, RideLayout, RideNotification,
    RidesManager,
};
use crate::coords::{Orientation, Point3};
use crate::sim_rng::SimRng;
use crate::track::PositionedTrackPiece;
use crate::voxel_world::{RideId, VoxelWorld};
use crate::{CoasterSimPlugin, SaveableRegistry, TickCounter};

/// A headless Bevy App running the coaster core for integration testing.
pub struct TestPark {
    app: App,
}

impl Default for TestPark {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPark {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// An empty park with the demo catalog loaded.
    pub fn new() -> Self {
        let catalog = demo_catalog().expect("demo catalog loads");
        Self::with_catalog(catalog)
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(CoasterSimPlugin);
        app.insert_resource(catalog);
        app.update();
        Self { app }
    }

    /// Re-seed the park RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.app.insert_resource(SimRng::from_seed_u64(seed));
        self
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run N fixed-update ticks by executing the `FixedUpdate` schedule
    /// directly, independent of wall-clock time. Each tick moves trains by
    /// the fixed timestep.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    /// Announce `n` new days, one per tick.
    pub fn advance_days(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().send_event(NewDay);
            self.tick(1);
        }
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Create a demo coaster and place a closed oval of `side` straight-ish
    /// pieces per long side at `origin`.
    pub fn with_demo_oval(&mut self, origin: Point3, side: usize) -> RideId {
        let world = self.app.world_mut();
        let catalog = world.resource::<Catalog>();
        let coaster_type = catalog
            .coaster_type_by_name(DEMO_COASTER_NAME)
            .expect("demo coaster type")
            .clone();
        let pieces = oval_layout(&coaster_type, origin, side);

        world.resource_scope(|world, catalog: Mut<Catalog>| {
            world.resource_scope(|world, mut voxels: Mut<VoxelWorld>| {
                let mut rides = world.resource_mut::<RidesManager>();
                let id = rides
                    .create_coaster(&catalog, &coaster_type)
                    .expect("demo coaster can be built");
                let ride = rides.get_mut(id).expect("ride was just created");
                for piece in pieces {
                    ride.add_piece(piece, &mut voxels).expect("oval piece fits");
                }
                ride.decide_ride_state(&mut voxels);
                id
            })
        })
    }

    /// Close and open a ride, drawing its breakdown countdown from the park RNG.
    pub fn open_ride(&mut self, id: RideId) {
        self.app
            .world_mut()
            .resource_scope(|world, mut rng: Mut<SimRng>| {
                let mut rides = world.resource_mut::<RidesManager>();
                rides.close(id).expect("ride can close");
                rides.open(id, &mut rng).expect("ride can open");
            });
    }

    /// Build every ride of a layout against the loaded catalog.
    pub fn with_layout(&mut self, layout: &ParkLayout) -> Result<Vec<RideId>, LayoutError> {
        let world = self.app.world_mut();
        world.resource_scope(|world, catalog: Mut<Catalog>| {
            world.resource_scope(|world, mut voxels: Mut<VoxelWorld>| {
                world.resource_scope(|world, mut rng: Mut<SimRng>| {
                    world
                        .resource_mut::<RidesManager>()
                        .build_park(layout, &catalog, &mut voxels, &mut rng)
                })
            })
        })
    }

    /// Encode every saveable resource, as a park save would.
    pub fn save(&mut self) -> BTreeMap<String, Vec<u8>> {
        self.app
            .world_mut()
            .resource_scope(|world, registry: Mut<SaveableRegistry>| registry.save_all(world))
    }

    /// Load a save produced by [`TestPark::save`]. Rides are rebuilt on the
    /// next tick.
    pub fn load(&mut self, save: &BTreeMap<String, Vec<u8>>) {
        self.app
            .world_mut()
            .resource_scope(|world, registry: Mut<SaveableRegistry>| {
                registry.load_all(world, save)
            });
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn rides(&self) -> &RidesManager {
        self.resource::<RidesManager>()
    }

    pub fn ride(&self, id: RideId) -> &CoasterInstance {
        self.rides().get(id).expect("ride exists")
    }

    /// Run `f` with the rides manager and the voxel world borrowed together.
    pub fn with_rides<R>(&mut self, f: impl FnOnce(&mut RidesManager, &mut VoxelWorld) -> R) -> R {
        self.app
            .world_mut()
            .resource_scope(|world, mut voxels: Mut<VoxelWorld>| {
                let mut rides = world.resource_mut::<RidesManager>();
                f(&mut rides, &mut voxels)
            })
    }

    pub fn voxels(&self) -> &VoxelWorld {
        self.resource::<VoxelWorld>()
    }

    pub fn ticks(&self) -> u64 {
        self.resource::<TickCounter>().0
    }

    /// Every ride notification still held by the event buffers.
    pub fn notifications(&mut self) -> Vec<RideNotification> {
        let events = self.app.world().resource::<Events<RideNotification>>();
        let mut cursor = events.get_cursor();
        cursor.read(events).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Track layouts
// ---------------------------------------------------------------------------

/// A flat, sprite-less piece type with a straight curve from the voxel's
/// west edge towards its exit.
pub fn synthetic_piece(length: u32, entry: u8, exit: u8, exit_offset: Point3) -> Arc<TrackPieceType> {
    Arc::new(TrackPieceType {
        id: PieceTypeId(0),
        entry: ConnectionCode(entry),
        exit: ConnectionCode(exit),
        exit_offset,
        speed: 0,
        flags: TrackFlags(0),
        cost: 0,
        voxels: vec![TrackVoxel {
            offset: Point3::ZERO,
            back: [None; 4],
            front: [None; 4],
            space: 0,
            has_platform: false,
            platform_direction: 0,
            is_powered: false,
        }],
        length,
        car_x: TrackCurve::Fixed(128.0),
        car_y: TrackCurve::Fixed(128.0),
        car_z: TrackCurve::Fixed(0.0),
        car_roll: TrackCurve::Fixed(0.0),
    })
}

/// Three synthetic pieces of the given lengths that close a loop:
/// east, then north, then back diagonally to the start.
pub fn triangle_loop(a: u32, b: u32, c: u32) -> Vec<PositionedTrackPiece> {
    let origin = Point3::new(4, 4, 1);
    vec![
        PositionedTrackPiece::new(
            synthetic_piece(a, 0, 4, Point3::new(1, 0, 0)),
            origin,
            Orientation::North,
        ),
        PositionedTrackPiece::new(
            synthetic_piece(b, 4, 8, Point3::new(0, 1, 0)),
            origin + Point3::new(1, 0, 0),
            Orientation::North,
        ),
        PositionedTrackPiece::new(
            synthetic_piece(c, 8, 0, Point3::new(-1, -1, 0)),
            origin + Point3::new(1, 1, 0),
            Orientation::North,
        ),
    ]
}

/// Placements of a closed demo oval: station and `n - 1` straights heading
/// +x, a left turn pair, lift and `n - 1` straights heading -x, and a second
/// turn pair back to the start.
pub fn oval_placements(origin: Point3, n: usize) -> Vec<(DemoPiece, Point3, Orientation)> {
    let (x0, y0, z) = (origin.x, origin.y, origin.z);
    let n = n as i32;
    let mut placements = Vec::new();

    for i in 0..n {
        let piece = if i == 0 { DemoPiece::Station } else { DemoPiece::Straight };
        placements.push((piece, Point3::new(x0 + i, y0, z), Orientation::North));
    }
    placements.push((DemoPiece::TurnLeft, Point3::new(x0 + n, y0, z), Orientation::North));
    placements.push((DemoPiece::TurnLeft, Point3::new(x0 + n, y0 + 1, z), Orientation::East));
    for i in 0..n {
        let piece = if i == 0 { DemoPiece::Lift } else { DemoPiece::Straight };
        placements.push((piece, Point3::new(x0 + n - 1 - i, y0 + 1, z), Orientation::South));
    }
    placements.push((DemoPiece::TurnLeft, Point3::new(x0 - 1, y0 + 1, z), Orientation::South));
    placements.push((DemoPiece::TurnLeft, Point3::new(x0 - 1, y0, z), Orientation::West));
    placements
}

/// The demo oval as positioned pieces of `coaster`.
pub fn oval_layout(coaster: &CoasterType, origin: Point3, n: usize) -> Vec<PositionedTrackPiece> {
    oval_placements(origin, n)
        .into_iter()
        .map(|(piece, voxel, orientation)| {
            PositionedTrackPiece::new(piece.of(coaster), voxel, orientation)
        })
        .collect()
}

/// The demo oval as a ride layout.
pub fn oval_ride_layout(origin: Point3, n: usize, trains: usize, cars: usize, open: bool) -> RideLayout {
    RideLayout {
        coaster_type: DEMO_COASTER_NAME.to_string(),
        trains,
        cars,
        open,
        pieces: oval_placements(origin, n)
            .into_iter()
            .map(|(piece, voxel, orientation)| PieceLayout {
                piece: piece as usize,
                voxel,
                orientation,
            })
            .collect(),
    }
}
