//! Declarative ride layouts: which coasters to build, their pieces and train
//! configuration. Read by the headless runner from JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::coords::{Orientation, Point3};
use crate::track::PositionedTrackPiece;
use crate::voxel_world::{RideId, VoxelWorld};

use super::rides::RidesManager;
use super::types::{PlacementError, RideState, RideStateError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParkLayout {
    pub rides: Vec<RideLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideLayout {
    /// Coaster type name in the catalog.
    pub coaster_type: String,
    #[serde(default = "one")]
    pub trains: usize,
    #[serde(default = "one")]
    pub cars: usize,
    /// Open the ride once the loop is closed.
    #[serde(default)]
    pub open: bool,
    pub pieces: Vec<PieceLayout>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PieceLayout {
    /// Index into the coaster type's piece list.
    pub piece: usize,
    pub voxel: Point3,
    #[serde(default)]
    pub orientation: Orientation,
}

fn one() -> usize {
    1
}

#[derive(Debug)]
pub enum LayoutError {
    UnknownCoasterType(String),
    UnknownPiece { coaster_type: String, index: usize },
    /// Train or car count outside what the coaster type supports.
    Capacity { coaster_type: String, trains: usize, cars: usize },
    NotALoop(String),
    Placement(PlacementError),
    Ride(RideStateError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::UnknownCoasterType(name) => write!(f, "Unknown coaster type '{name}'"),
            LayoutError::UnknownPiece {
                coaster_type,
                index,
            } => write!(f, "Coaster type '{coaster_type}' has no piece #{index}"),
            LayoutError::Capacity {
                coaster_type,
                trains,
                cars,
            } => write!(
                f,
                "Coaster type '{coaster_type}' cannot run {trains} trains of {cars} cars"
            ),
            LayoutError::NotALoop(name) => write!(f, "Track of '{name}' does not form a loop"),
            LayoutError::Placement(e) => write!(f, "Placement error: {e}"),
            LayoutError::Ride(e) => write!(f, "Ride error: {e}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutError::Placement(e) => Some(e),
            LayoutError::Ride(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PlacementError> for LayoutError {
    fn from(e: PlacementError) -> Self {
        LayoutError::Placement(e)
    }
}

impl From<RideStateError> for LayoutError {
    fn from(e: RideStateError) -> Self {
        LayoutError::Ride(e)
    }
}

impl RidesManager {
    /// Build one ride from its layout: place the pieces, close the loop,
    /// configure trains and optionally open it.
    ///
    /// A ride that fails half-way is destroyed again.
    pub fn build_from_layout(
        &mut self,
        layout: &RideLayout,
        catalog: &Catalog,
        world: &mut VoxelWorld,
        rng: &mut crate::sim_rng::SimRng,
    ) -> Result<RideId, LayoutError> {
        let coaster_type = catalog
            .coaster_type_by_name(&layout.coaster_type)
            .ok_or_else(|| LayoutError::UnknownCoasterType(layout.coaster_type.clone()))?
            .clone();
        let id = self.create_coaster(catalog, &coaster_type)?;
        let result = self.populate(id, layout, world, rng);
        if result.is_err() {
            self.destroy(id, world)?;
        }
        result.map(|()| id)
    }

    fn populate(
        &mut self,
        id: RideId,
        layout: &RideLayout,
        world: &mut VoxelWorld,
        rng: &mut crate::sim_rng::SimRng,
    ) -> Result<(), LayoutError> {
        let ride = self
            .get_mut(id)
            .ok_or(RideStateError::UnknownRide(id))?;
        let coaster_type = ride.coaster_type().clone();
        for p in &layout.pieces {
            let piece = coaster_type.pieces.get(p.piece).cloned().ok_or_else(|| {
                LayoutError::UnknownPiece {
                    coaster_type: coaster_type.name.clone(),
                    index: p.piece,
                }
            })?;
            ride.add_piece(PositionedTrackPiece::new(piece, p.voxel, p.orientation), world)?;
        }
        if ride.decide_ride_state(world) != RideState::Testing {
            return Err(LayoutError::NotALoop(ride.name().to_string()));
        }

        let trains_ok = (1..=ride.max_number_of_trains()).contains(&layout.trains);
        let cars_ok = (1..=ride.max_number_of_cars()).contains(&layout.cars);
        if !trains_ok || !cars_ok {
            return Err(LayoutError::Capacity {
                coaster_type: coaster_type.name.clone(),
                trains: layout.trains,
                cars: layout.cars,
            });
        }
        ride.set_number_of_cars(layout.cars, world);
        ride.set_number_of_trains(layout.trains, world);

        if layout.open {
            ride.close()?;
            ride.open(rng)?;
        }
        Ok(())
    }

    /// Build every ride of a park layout, stopping at the first failure.
    pub fn build_park(
        &mut self,
        layout: &ParkLayout,
        catalog: &Catalog,
        world: &mut VoxelWorld,
        rng: &mut crate::sim_rng::SimRng,
    ) -> Result<Vec<RideId>, LayoutError> {
        layout
            .rides
            .iter()
            .map(|ride| self.build_from_layout(ride, catalog, world, rng))
            .collect()
    }
}
