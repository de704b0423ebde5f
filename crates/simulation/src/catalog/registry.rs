use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::config::MAX_CAR_TYPES;
use crate::rcd::RcdError;

use super::track_piece::{PieceTypeId, SpriteId, TrackPieceType};
use super::types::{CarType, CarTypeId, CoasterPlatform, CoasterType, CoasterTypeId, PlatformType};

/// Everything loaded from catalog files: track pieces, car types, coaster
/// types and station platforms.
///
/// Entries are shared by reference with every placed piece and ride instance
/// and never change after registration.
#[derive(Resource, Debug, Default)]
pub struct Catalog {
    pieces: BTreeMap<PieceTypeId, Arc<TrackPieceType>>,
    /// Registration order; the first entry is the default car type.
    car_types: Vec<Arc<CarType>>,
    coaster_types: BTreeMap<CoasterTypeId, Arc<CoasterType>>,
    platforms: BTreeMap<PlatformType, CoasterPlatform>,
    sprite_count: u32,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a catalog-wide sprite id for a newly loaded image.
    pub fn allocate_sprite(&mut self) -> SpriteId {
        self.sprite_count += 1;
        SpriteId(self.sprite_count)
    }

    pub fn sprite_count(&self) -> u32 {
        self.sprite_count
    }

    /// Register a track piece, assigning its id.
    pub fn add_track_piece(&mut self, mut piece: TrackPieceType) -> Arc<TrackPieceType> {
        piece.id = PieceTypeId(self.pieces.len() as u32 + 1);
        let piece = Arc::new(piece);
        self.pieces.insert(piece.id, Arc::clone(&piece));
        piece
    }

    pub fn track_piece(&self, id: PieceTypeId) -> Option<&Arc<TrackPieceType>> {
        self.pieces.get(&id)
    }

    pub fn track_piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Register a car type, assigning its id.
    ///
    /// # Errors
    ///
    /// [`RcdError::TableFull`] once [`MAX_CAR_TYPES`] car types exist.
    pub fn add_car_type(&mut self, mut car_type: CarType) -> Result<CarTypeId, RcdError> {
        if self.car_types.len() >= MAX_CAR_TYPES {
            return Err(RcdError::TableFull {
                table: "car types",
                capacity: MAX_CAR_TYPES,
            });
        }
        let id = CarTypeId(self.car_types.len() as u16);
        car_type.id = id;
        self.car_types.push(Arc::new(car_type));
        Ok(id)
    }

    pub fn car_type(&self, id: CarTypeId) -> Option<&Arc<CarType>> {
        self.car_types.get(id.0 as usize)
    }

    pub fn car_type_count(&self) -> usize {
        self.car_types.len()
    }

    /// The car type new coasters start with: the first one registered.
    pub fn default_car_type(&self) -> Option<&Arc<CarType>> {
        self.car_types.first()
    }

    /// Register a coaster type, assigning its id. Replaces nothing: names
    /// may repeat, lookups by name return the first match.
    pub fn add_coaster_type(&mut self, mut coaster_type: CoasterType) -> CoasterTypeId {
        let id = CoasterTypeId(self.coaster_types.len() as u16 + 1);
        coaster_type.id = id;
        self.coaster_types.insert(id, Arc::new(coaster_type));
        id
    }

    pub fn coaster_type(&self, id: CoasterTypeId) -> Option<&Arc<CoasterType>> {
        self.coaster_types.get(&id)
    }

    pub fn coaster_type_by_name(&self, name: &str) -> Option<&Arc<CoasterType>> {
        self.coaster_types.values().find(|t| t.name == name)
    }

    pub fn coaster_types(&self) -> impl Iterator<Item = &Arc<CoasterType>> {
        self.coaster_types.values()
    }

    /// Register station platform graphics. A later platform of the same type
    /// replaces the earlier one.
    pub fn add_platform(&mut self, platform: CoasterPlatform) {
        if self
            .platforms
            .insert(platform.platform_type, platform.clone())
            .is_some()
        {
            warn!(
                "Replacing coaster platform graphics of type {}",
                platform.platform_type.0
            );
        }
    }

    pub fn platform(&self, platform_type: PlatformType) -> Option<&CoasterPlatform> {
        self.platforms.get(&platform_type)
    }

    /// A coaster can only be built once there is a car type to run on it.
    pub fn can_make_instance(&self, coaster_type: &CoasterType) -> bool {
        !coaster_type.pieces.is_empty() && self.default_car_type().is_some()
    }
}
