use bevy::prelude::*;

use crate::sim_rng::SimRng;
use crate::simulation_sets::SimulationSet;
use crate::voxel_world::VoxelWorld;

use super::persistence::{has_pending_restore, restore_rides};
use super::rides::RidesManager;
use super::types::{BreakdownState, NewDay, RideNotification, RideState};

/// Park-wide ride counters, refreshed every tick.
#[derive(Resource, Debug, Default, Clone, PartialEq, Eq)]
pub struct RideStats {
    pub rides: usize,
    pub open: usize,
    pub testing: usize,
    pub broken: usize,
    pub trains_running: usize,
    pub cars_running: usize,
}

/// Move every train by the length of one fixed tick.
pub fn animate_rides(
    time: Res<Time<Fixed>>,
    mut rides: ResMut<RidesManager>,
    mut world: ResMut<VoxelWorld>,
) {
    let delay = time.timestep().as_millis() as u32;
    if delay == 0 {
        return;
    }
    rides.on_animate(delay, &mut world);
}

/// Breakdown bookkeeping for each day the calendar announces.
pub fn handle_new_day(
    mut days: EventReader<NewDay>,
    mut rides: ResMut<RidesManager>,
    mut rng: ResMut<SimRng>,
) {
    for _ in days.read() {
        rides.on_new_day(&mut rng);
    }
}

/// Forward ride notifications as events.
pub fn emit_ride_notifications(
    mut rides: ResMut<RidesManager>,
    mut events: EventWriter<RideNotification>,
) {
    for notification in rides.take_notifications() {
        events.send(notification);
    }
}

pub fn update_ride_stats(rides: Res<RidesManager>, mut stats: ResMut<RideStats>) {
    let mut next = RideStats {
        rides: rides.len(),
        ..Default::default()
    };
    for ride in rides.iter() {
        match ride.state() {
            RideState::Open => next.open += 1,
            RideState::Testing => next.testing += 1,
            _ => {}
        }
        if ride.breakdown() == BreakdownState::Broken {
            next.broken += 1;
        }
        if ride.track().is_some() {
            next.trains_running += ride.trains().len();
            next.cars_running += ride.trains().iter().map(|t| t.cars.len()).sum::<usize>();
        }
    }
    if *stats != next {
        *stats = next;
    }
}

pub struct CoasterPlugin;

impl Plugin for CoasterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RidesManager>()
            .init_resource::<RideStats>()
            .init_resource::<VoxelWorld>()
            .add_event::<NewDay>()
            .add_event::<RideNotification>()
            .add_systems(
                FixedUpdate,
                (
                    restore_rides.run_if(has_pending_restore),
                    handle_new_day,
                )
                    .chain()
                    .in_set(SimulationSet::PreSim),
            )
            .add_systems(FixedUpdate, animate_rides.in_set(SimulationSet::Simulation))
            .add_systems(
                FixedUpdate,
                (emit_ride_notifications, update_ride_stats).in_set(SimulationSet::PostSim),
            );

        app.init_resource::<crate::SaveableRegistry>();
        app.world_mut()
            .resource_mut::<crate::SaveableRegistry>()
            .register::<RidesManager>();
    }
}
