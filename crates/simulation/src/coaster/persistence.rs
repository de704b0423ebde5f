// ---------------------------------------------------------------------------
// Save and load of ride instances
// ---------------------------------------------------------------------------
//
// Rides reference catalog entries by `Arc`, which cannot be decoded on their
// own. A loaded snapshot is parked in `RidesManager::pending_restore` and
// rebuilt against the catalog and voxel world by `restore_rides`.

use std::collections::HashMap;

use bevy::prelude::*;
use bitcode::{Decode, Encode};

use crate::catalog::Catalog;
use crate::coords::{Orientation, Point3};
use crate::track::{assemble_loop, PieceId, PositionedTrackPiece};
use crate::voxel_world::{RideId, VoxelWorld};
use crate::Saveable;

use super::instance::CoasterInstance;
use super::rides::RidesManager;
use super::types::{BreakdownState, RideState};

#[derive(Encode, Decode, Debug, Clone, Default, PartialEq)]
pub struct RidesSnapshot {
    pub rides: Vec<RideRecord>,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct RideRecord {
    pub id: RideId,
    pub name: String,
    pub coaster_type: String,
    pub state: RideState,
    pub breakdown: BreakdownState,
    pub reliability: u32,
    pub pieces: Vec<PieceRecord>,
    /// Loop order as piece slots.
    pub order: Vec<u16>,
    pub trains: Vec<TrainRecord>,
}

#[derive(Encode, Decode, Debug, Clone, Copy, PartialEq)]
pub struct PieceRecord {
    pub slot: u16,
    /// Index into the coaster type's piece list.
    pub piece_index: u16,
    pub base: Point3,
    pub orientation: Orientation,
}

#[derive(Encode, Decode, Debug, Clone, Copy, PartialEq)]
pub struct TrainRecord {
    pub cars: u16,
    pub back_position: u32,
    pub speed: i32,
}

impl CoasterInstance {
    fn record(&self) -> RideRecord {
        let pieces = self
            .pieces
            .iter()
            .filter_map(|(id, p)| {
                let piece_index = self.coaster_type.piece_index(p.piece.id)?;
                Some(PieceRecord {
                    slot: id.0,
                    piece_index: piece_index as u16,
                    base: p.base_voxel,
                    orientation: p.orientation,
                })
            })
            .collect();
        RideRecord {
            id: self.id,
            name: self.name.clone(),
            coaster_type: self.coaster_type.name.clone(),
            state: self.state,
            breakdown: self.breakdown,
            reliability: self.reliability,
            pieces,
            order: self.order.iter().map(|id| id.0).collect(),
            trains: self
                .trains()
                .iter()
                .map(|t| TrainRecord {
                    cars: t.cars.len() as u16,
                    back_position: t.back_position,
                    speed: t.speed,
                })
                .collect(),
        }
    }

    /// Rebuild a ride from its record. Pieces that no longer fit are dropped
    /// with a warning; a track that stopped forming a loop reopens building.
    fn from_record(
        record: RideRecord,
        catalog: &Catalog,
        world: &mut VoxelWorld,
    ) -> Option<CoasterInstance> {
        let Some(coaster_type) = catalog.coaster_type_by_name(&record.coaster_type).cloned() else {
            warn!(
                "Ride '{}': coaster type '{}' is not in the catalog, dropping it",
                record.name, record.coaster_type
            );
            return None;
        };
        let Some(car_type) = catalog.default_car_type().cloned() else {
            warn!("Ride '{}': no car type loaded, dropping it", record.name);
            return None;
        };

        let mut ride = CoasterInstance::new(record.id, record.name, coaster_type, car_type);
        ride.reliability = record.reliability;
        ride.breakdown = record.breakdown;

        let mut slots: HashMap<u16, PieceId> = HashMap::new();
        for p in &record.pieces {
            let Some(piece) = ride.coaster_type.pieces.get(usize::from(p.piece_index)).cloned()
            else {
                warn!("Ride '{}': unknown piece index {}", ride.name, p.piece_index);
                continue;
            };
            let positioned = PositionedTrackPiece::new(piece, p.base, p.orientation);
            match ride.add_piece(positioned, world) {
                Ok(id) => {
                    slots.insert(p.slot, id);
                }
                Err(e) => warn!("Ride '{}': dropping saved piece: {e}", ride.name),
            }
        }
        ride.order = record
            .order
            .iter()
            .filter_map(|slot| slots.get(slot).copied())
            .collect();

        let max_cars = ride.max_number_of_cars();
        let max_trains = ride.max_number_of_trains();
        for (index, t) in record.trains.iter().take(max_trains).enumerate() {
            let cars = usize::from(t.cars).min(max_cars);
            ride.trains[index].set_length(cars, world, ride.id, index as u8);
        }

        let needs_loop = matches!(
            record.state,
            RideState::Testing | RideState::Closed | RideState::Open
        );
        ride.state = if ride.pieces.is_empty() {
            RideState::Allocated
        } else {
            RideState::Building
        };
        if needs_loop {
            let assembly = assemble_loop(&mut ride.pieces, &ride.order);
            ride.order = assembly.order;
            match assembly.track {
                Some(track) => {
                    for (train, t) in ride.trains.iter_mut().zip(&record.trains) {
                        train.place_at(Some(&track), t.back_position);
                        train.speed = t.speed;
                    }
                    ride.track = Some(track);
                    ride.state = record.state;
                }
                None => warn!("Ride '{}': saved track no longer closes", ride.name),
            }
        }
        ride.notifications.clear();
        Some(ride)
    }
}

impl RidesManager {
    pub fn snapshot(&self) -> RidesSnapshot {
        RidesSnapshot {
            rides: self.rides.values().map(CoasterInstance::record).collect(),
        }
    }

    /// Rebuild rides from loaded save data. Returns how many were restored.
    pub fn restore(&mut self, catalog: &Catalog, world: &mut VoxelWorld) -> usize {
        let Some(snapshot) = self.pending_restore.take() else {
            return 0;
        };
        let mut restored = 0;
        for record in snapshot.rides {
            if self.rides.contains_key(&record.id) {
                warn!("Ride #{} restored twice, skipping", record.id.0);
                continue;
            }
            if let Some(ride) = CoasterInstance::from_record(record, catalog, world) {
                self.rides.insert(ride.id, ride);
                restored += 1;
            }
        }
        info!("Restored {restored} rides");
        restored
    }
}

impl Saveable for RidesManager {
    const SAVE_KEY: &'static str = "coaster_rides";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.rides.is_empty() {
            return None;
        }
        Some(bitcode::encode(&self.snapshot()))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        RidesManager {
            rides: Default::default(),
            pending_restore: crate::decode_or_warn::<RidesSnapshot>(Self::SAVE_KEY, bytes),
        }
    }
}

/// Rebuild rides once a save has been loaded. Rides are the only occupants
/// of the voxel world, so it starts over empty.
pub fn restore_rides(
    mut rides: ResMut<RidesManager>,
    catalog: Res<Catalog>,
    mut world: ResMut<VoxelWorld>,
) {
    *world = VoxelWorld::new(world.x_size, world.y_size, world.z_size);
    rides.restore(&catalog, &mut world);
}

/// Run condition for [`restore_rides`].
pub fn has_pending_restore(rides: Res<RidesManager>) -> bool {
    rides.has_pending_restore()
}
