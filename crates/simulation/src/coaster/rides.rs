use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::catalog::{Catalog, CoasterType};
use crate::config::MAX_RIDE_INSTANCES;
use crate::sim_rng::SimRng;
use crate::voxel_world::{RideId, VoxelWorld};

use super::instance::CoasterInstance;
use super::persistence::RidesSnapshot;
use super::types::{RideNotification, RideState, RideStateError};

/// Every coaster in the park, keyed by ride id.
#[derive(Resource, Debug, Default)]
pub struct RidesManager {
    pub(super) rides: BTreeMap<RideId, CoasterInstance>,
    /// Loaded save data waiting for the catalog and world to rebuild from.
    pub(super) pending_restore: Option<RidesSnapshot>,
}

impl RidesManager {
    pub fn len(&self) -> usize {
        self.rides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rides.is_empty()
    }

    pub fn get(&self, id: RideId) -> Option<&CoasterInstance> {
        self.rides.get(&id)
    }

    pub fn get_mut(&mut self, id: RideId) -> Option<&mut CoasterInstance> {
        self.rides.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoasterInstance> {
        self.rides.values()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CoasterInstance> {
        self.rides.values().find(|r| r.name() == name)
    }

    pub fn has_pending_restore(&self) -> bool {
        self.pending_restore.is_some()
    }

    fn ride_mut(&mut self, id: RideId) -> Result<&mut CoasterInstance, RideStateError> {
        self.rides
            .get_mut(&id)
            .ok_or(RideStateError::UnknownRide(id))
    }

    /// Lowest unused ride id.
    pub(super) fn free_id(&self) -> Option<RideId> {
        (0..MAX_RIDE_INSTANCES as u16)
            .map(RideId)
            .find(|id| !self.rides.contains_key(id))
    }

    /// `base`, or `base N` with the smallest N >= 2 no ride uses yet.
    pub fn unique_name(&self, base: &str) -> String {
        if self.find_by_name(base).is_none() {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} {n}"))
            .find(|name| self.find_by_name(name).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Create an empty coaster of `coaster_type`, running the catalog's
    /// default car type.
    pub fn create_coaster(
        &mut self,
        catalog: &Catalog,
        coaster_type: &Arc<CoasterType>,
    ) -> Result<RideId, RideStateError> {
        let car_type = catalog
            .default_car_type()
            .filter(|_| catalog.can_make_instance(coaster_type))
            .ok_or_else(|| RideStateError::CannotMakeInstance(coaster_type.name.clone()))?;
        let id = self.free_id().ok_or(RideStateError::TooManyRides)?;
        let name = self.unique_name(&coaster_type.name);
        info!("Created ride '{name}' (#{}) of type '{}'", id.0, coaster_type.name);
        self.rides.insert(
            id,
            CoasterInstance::new(id, name, coaster_type.clone(), car_type.clone()),
        );
        Ok(id)
    }

    /// Create a coaster by type name.
    pub fn create_coaster_named(
        &mut self,
        catalog: &Catalog,
        type_name: &str,
    ) -> Result<RideId, RideStateError> {
        let coaster_type = catalog
            .coaster_type_by_name(type_name)
            .ok_or_else(|| RideStateError::CannotMakeInstance(type_name.to_string()))?
            .clone();
        self.create_coaster(catalog, &coaster_type)
    }

    /// Remove a ride and everything it placed in the world.
    pub fn destroy(&mut self, id: RideId, world: &mut VoxelWorld) -> Result<(), RideStateError> {
        let mut ride = self
            .rides
            .remove(&id)
            .ok_or(RideStateError::UnknownRide(id))?;
        ride.remove_all_people();
        ride.release(world);
        info!("Destroyed ride '{}' (#{})", ride.name(), id.0);
        Ok(())
    }

    /// Rename a ride. Fails if another ride already has the name.
    pub fn rename(&mut self, id: RideId, name: &str) -> Result<bool, RideStateError> {
        if self.find_by_name(name).is_some_and(|r| r.id() != id) {
            return Ok(false);
        }
        self.ride_mut(id)?.name = name.to_string();
        Ok(true)
    }

    pub fn open(&mut self, id: RideId, rng: &mut SimRng) -> Result<(), RideStateError> {
        self.ride_mut(id)?.open(rng)
    }

    pub fn close(&mut self, id: RideId) -> Result<(), RideStateError> {
        self.ride_mut(id)?.close()
    }

    pub fn build(&mut self, id: RideId) -> Result<(), RideStateError> {
        self.ride_mut(id)?.build()
    }

    /// Advance the trains of every ride past allocation.
    pub fn on_animate(&mut self, delay: u32, world: &mut VoxelWorld) {
        for ride in self.rides.values_mut() {
            if ride.state() != RideState::Allocated {
                ride.on_animate(delay, world);
            }
        }
    }

    pub fn on_new_day(&mut self, rng: &mut SimRng) {
        for ride in self.rides.values_mut() {
            ride.on_new_day(rng);
        }
    }

    /// Drain pending notifications of every ride, in ride id order.
    pub fn take_notifications(&mut self) -> Vec<RideNotification> {
        self.rides
            .values_mut()
            .flat_map(CoasterInstance::take_notifications)
            .collect()
    }
}
