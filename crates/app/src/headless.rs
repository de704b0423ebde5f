//! Headless park runner: load a catalog and a layout, run the fixed-tick
//! simulation for a number of ticks and report where every train ended up.
//!
//! Logging goes to stderr through Bevy's `LogPlugin`; the JSON report is the
//! only thing written to stdout.

use std::fmt;
use std::path::PathBuf;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use serde::Serialize;

use coaster_sim::catalog::demo::demo_catalog;
use coaster_sim::catalog::{load_rcd_file, Catalog};
use coaster_sim::coaster::{
    BreakdownState, LayoutError, NewDay, ParkLayout, RideState, RideStats, RidesManager,
};
use coaster_sim::rcd::RcdError;
use coaster_sim::sim_rng::SimRng;
use coaster_sim::voxel_world::VoxelWorld;
use coaster_sim::{CoasterSimPlugin, TickCounter};

const DEMO_LAYOUT: &str = include_str!("../assets/demo_oval.json");

/// Run a coaster park without a window and print a JSON report of every ride.
///
/// Without --catalog the built-in demo coaster is used; without --layout a
/// demo oval is built on it.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "coaster_park", version, about, long_about = None)]
pub struct Options {
    /// RCD catalog file providing the coaster types.
    #[arg(long, value_name = "FILE.rcd")]
    pub catalog: Option<PathBuf>,
    /// JSON park layout to build before running.
    #[arg(long, value_name = "FILE.json")]
    pub layout: Option<PathBuf>,
    /// Number of fixed ticks to simulate.
    #[arg(long, value_name = "N", default_value_t = 600)]
    pub ticks: u32,
    /// Fixed ticks between two `NewDay` announcements.
    #[arg(
        long = "ticks-per-day",
        value_name = "N",
        default_value_t = 100,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub ticks_per_day: u32,
    /// Seed for the simulation RNG; breakdown countdowns depend on it.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum RunError {
    Catalog(RcdError),
    ReadLayout(PathBuf, std::io::Error),
    ParseLayout(serde_json::Error),
    Layout(LayoutError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Catalog(e) => write!(f, "Cannot load catalog: {e}"),
            RunError::ReadLayout(path, e) => {
                write!(f, "Cannot read layout {}: {e}", path.display())
            }
            RunError::ParseLayout(e) => write!(f, "Invalid layout: {e}"),
            RunError::Layout(e) => write!(f, "Cannot build layout: {e}"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<RcdError> for RunError {
    fn from(e: RcdError) -> Self {
        RunError::Catalog(e)
    }
}

impl From<LayoutError> for RunError {
    fn from(e: LayoutError) -> Self {
        RunError::Layout(e)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ParkReport {
    pub ticks: u64,
    pub days: u32,
    pub rides: Vec<RideReport>,
}

#[derive(Debug, Serialize)]
pub struct RideReport {
    pub id: u16,
    pub name: String,
    pub state: RideState,
    pub broken: bool,
    pub loop_length: u32,
    pub trains: Vec<TrainReport>,
}

#[derive(Debug, Serialize)]
pub struct TrainReport {
    pub cars: usize,
    pub back_position: u32,
    pub speed: i32,
    pub piece: usize,
}

fn park_report(world: &World, days: u32) -> ParkReport {
    let rides = world
        .resource::<RidesManager>()
        .iter()
        .map(|ride| RideReport {
            id: ride.id().0,
            name: ride.name().to_string(),
            state: ride.state(),
            broken: ride.breakdown() == BreakdownState::Broken,
            loop_length: ride.track().map_or(0, |t| t.length()),
            trains: ride
                .trains()
                .iter()
                .map(|t| TrainReport {
                    cars: t.cars.len(),
                    back_position: t.back_position,
                    speed: t.speed,
                    piece: t.cur_piece,
                })
                .collect(),
        })
        .collect();
    ParkReport {
        ticks: world.resource::<TickCounter>().0,
        days,
        rides,
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

fn load_catalog(options: &Options) -> Result<Catalog, RunError> {
    let Some(path) = &options.catalog else {
        return Ok(demo_catalog()?);
    };
    let mut catalog = Catalog::new();
    let report = load_rcd_file(&mut catalog, path)?;
    for (block, name, reason) in &report.rejected {
        warn!(
            "Skipped block #{block} ({}): {reason}",
            String::from_utf8_lossy(name)
        );
    }
    Ok(catalog)
}

fn load_layout(options: &Options) -> Result<ParkLayout, RunError> {
    let text = match &options.layout {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| RunError::ReadLayout(path.clone(), e))?,
        None => DEMO_LAYOUT.to_string(),
    };
    serde_json::from_str(&text).map_err(RunError::ParseLayout)
}

pub fn run(options: &Options) -> Result<ParkReport, RunError> {
    // -- Build a minimal Bevy App: fixed-tick core, logging, no rendering ----
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(LogPlugin::default());
    app.add_plugins(CoasterSimPlugin);
    if let Some(seed) = options.seed {
        app.insert_resource(SimRng::from_seed_u64(seed));
    }

    let catalog = load_catalog(options)?;
    let layout = load_layout(options)?;
    app.insert_resource(catalog);
    app.update();

    let ids = app.world_mut().resource_scope(|world, catalog: Mut<Catalog>| {
        world.resource_scope(|world, mut voxels: Mut<VoxelWorld>| {
            world.resource_scope(|world, mut rng: Mut<SimRng>| {
                world
                    .resource_mut::<RidesManager>()
                    .build_park(&layout, &catalog, &mut voxels, &mut rng)
            })
        })
    })?;
    info!("Built {} rides, running {} ticks", ids.len(), options.ticks);

    // -- Drive FixedUpdate directly: the run is independent of wall time ----
    let mut days = 0;
    for tick in 1..=options.ticks {
        app.world_mut().run_schedule(FixedUpdate);
        if tick % options.ticks_per_day == 0 {
            app.world_mut().send_event(NewDay);
            days += 1;
        }
    }

    let stats = app.world().resource::<RideStats>();
    info!(
        "{} rides ({} open, {} broken), {} trains with {} cars running",
        stats.rides, stats.open, stats.broken, stats.trains_running, stats.cars_running
    );
    Ok(park_report(app.world(), days))
}
