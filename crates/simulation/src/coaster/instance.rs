use std::sync::Arc;

use bevy::prelude::*;

use crate::catalog::{CarType, Catalog, CoasterType, SpriteId, MAX_TRACK_VOXELS};
use crate::config::{BREAKDOWN_GRACE_PERIOD, DEFAULT_RELIABILITY, MAX_TRAINS_PER_COASTER};
use crate::coords::{Orientation, Point3};
use crate::sim_rng::SimRng;
use crate::track::{assemble_loop, PieceId, PositionedTrackPiece, TrackArena, TrackLoop};
use crate::voxel_world::{RideId, VoxelWorld};

use super::types::{
    BreakdownState, PlacementError, RideEntryResult, RideNotification, RideState,
    RideStateError, Train,
};

/// Bits of voxel instance data holding the piece orientation.
const ORIENTATION_BITS: u16 = 2;

/// Voxel instance data of a coaster track voxel.
pub fn pack_voxel_data(track_voxel: u16, orientation: Orientation) -> u16 {
    debug_assert!(usize::from(track_voxel) < MAX_TRACK_VOXELS);
    (track_voxel << ORIENTATION_BITS) | u16::from(orientation.quarter_turns())
}

/// Inverse of [`pack_voxel_data`].
pub fn unpack_voxel_data(data: u16) -> (u16, Orientation) {
    (
        data >> ORIENTATION_BITS,
        Orientation::from_quarter_turns((data & 3) as u8),
    )
}

/// A roller coaster placed in the park.
#[derive(Debug)]
pub struct CoasterInstance {
    pub(super) id: RideId,
    pub(super) name: String,
    pub(super) coaster_type: Arc<CoasterType>,
    pub(super) car_type: Arc<CarType>,
    pub(super) state: RideState,
    pub(super) breakdown: BreakdownState,
    pub(super) reliability: u32,
    pub(super) pieces: TrackArena,
    /// Piece order of the last loop assembly; the next one starts from it.
    pub(super) order: Vec<PieceId>,
    pub(super) track: Option<TrackLoop>,
    pub(super) trains: Vec<Train>,
    pub(super) notifications: Vec<RideNotification>,
}

impl CoasterInstance {
    pub fn new(
        id: RideId,
        name: String,
        coaster_type: Arc<CoasterType>,
        car_type: Arc<CarType>,
    ) -> Self {
        Self {
            id,
            name,
            coaster_type,
            car_type,
            state: RideState::Allocated,
            breakdown: BreakdownState::Unopened,
            reliability: DEFAULT_RELIABILITY,
            pieces: TrackArena::default(),
            order: Vec::new(),
            track: None,
            trains: vec![Train::default(); MAX_TRAINS_PER_COASTER],
            notifications: Vec::new(),
        }
    }

    pub fn id(&self) -> RideId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coaster_type(&self) -> &Arc<CoasterType> {
        &self.coaster_type
    }

    pub fn car_type(&self) -> &Arc<CarType> {
        &self.car_type
    }

    pub fn state(&self) -> RideState {
        self.state
    }

    pub fn breakdown(&self) -> BreakdownState {
        self.breakdown
    }

    pub fn pieces(&self) -> &TrackArena {
        &self.pieces
    }

    /// The assembled loop, if the track currently forms one.
    pub fn track(&self) -> Option<&TrackLoop> {
        self.track.as_ref()
    }

    /// Trains in use.
    pub fn trains(&self) -> &[Train] {
        &self.trains[..self.number_of_trains()]
    }

    /// Drain the notifications raised since the last call.
    pub fn take_notifications(&mut self) -> Vec<RideNotification> {
        std::mem::take(&mut self.notifications)
    }

    fn set_state(&mut self, to: RideState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        info!("Ride '{}' is now {to} (was {from})", self.name);
        self.notifications.push(RideNotification::StateChanged {
            ride: self.id,
            from,
            to,
        });
    }

    // -------------------------------------------------------------------------
    // Track editing
    // -------------------------------------------------------------------------

    fn check_editable(&self) -> Result<(), PlacementError> {
        match self.state {
            RideState::Allocated | RideState::Building => Ok(()),
            state => Err(PlacementError::NotBuilding(state)),
        }
    }

    /// Place a piece of this coaster's type and claim its voxels.
    pub fn add_piece(
        &mut self,
        piece: PositionedTrackPiece,
        world: &mut VoxelWorld,
    ) -> Result<PieceId, PlacementError> {
        self.check_editable()?;
        let data: Vec<u16> = piece
            .voxels()
            .map(|(i, _)| {
                self.coaster_type
                    .track_voxel_index(piece.piece.id, i)
                    .map(|index| pack_voxel_data(index, piece.orientation))
            })
            .collect::<Option<_>>()
            .ok_or(PlacementError::ForeignPiece)?;
        if !piece.is_on_world(world) {
            return Err(PlacementError::OffWorld);
        }
        if let Some((_, voxel)) = piece.voxels().find(|&(_, v)| !world.can_place_instance(v)) {
            return Err(PlacementError::Occupied(voxel));
        }

        let voxels: Vec<Point3> = piece.voxels().map(|(_, v)| v).collect();
        let id = self.pieces.insert(piece).ok_or(PlacementError::Full)?;
        for (voxel, data) in voxels.into_iter().zip(data) {
            world.set_instance_occupant(voxel, self.id, data);
        }
        self.track = None;
        if self.state == RideState::Allocated {
            self.set_state(RideState::Building);
        }
        Ok(id)
    }

    /// Remove a placed piece and release its voxels.
    pub fn remove_piece(
        &mut self,
        id: PieceId,
        world: &mut VoxelWorld,
    ) -> Result<PositionedTrackPiece, PlacementError> {
        self.check_editable()?;
        let piece = self
            .pieces
            .remove(id)
            .ok_or(PlacementError::UnknownPiece(id))?;
        for (_, voxel) in piece.voxels() {
            world.clear_instance_occupant(voxel, self.id);
        }
        self.track = None;
        Ok(piece)
    }

    pub fn is_accessible(&self) -> bool {
        !self.pieces.is_empty()
    }

    /// Re-assemble the loop and pick the state that follows from it: no loop
    /// means building; a new or changed loop means testing (with a train
    /// allocated if there is none).
    pub fn decide_ride_state(&mut self, world: &mut VoxelWorld) -> RideState {
        let assembly = assemble_loop(&mut self.pieces, &self.order);
        self.order = assembly.order;
        let Some(track) = assembly.track else {
            self.track = None;
            self.set_state(RideState::Building);
            return self.state;
        };
        self.track = Some(track);

        if assembly.changed {
            self.spread_trains();
        }
        if assembly.changed || !matches!(self.state, RideState::Closed | RideState::Open) {
            if self.number_of_trains() == 0 {
                self.set_number_of_trains(1, world);
                self.set_number_of_cars(1, world);
                self.notifications.push(RideNotification::TrainsAllocated {
                    ride: self.id,
                    trains: 1,
                    cars: 1,
                });
            }
            self.set_state(RideState::Testing);
        }
        self.state
    }

    // -------------------------------------------------------------------------
    // Trains and cars
    // -------------------------------------------------------------------------

    pub fn max_number_of_trains(&self) -> usize {
        usize::from(self.coaster_type.max_number_trains).min(MAX_TRAINS_PER_COASTER)
    }

    pub fn max_number_of_cars(&self) -> usize {
        usize::from(self.coaster_type.max_number_cars)
    }

    pub fn number_of_trains(&self) -> usize {
        self.trains.iter().take_while(|t| t.is_used()).count()
    }

    /// Cars per train, `1` when no train is in use.
    pub fn number_of_cars(&self) -> usize {
        match self.trains[0].cars.len() {
            0 => 1,
            n => n,
        }
    }

    /// Use `number` trains (`0` means one), each with the current car count,
    /// and spread them evenly over the loop.
    pub fn set_number_of_trains(&mut self, number: usize, world: &mut VoxelWorld) {
        let number = number.max(1);
        assert!(
            number <= self.max_number_of_trains(),
            "{number} trains exceed the maximum of {}",
            self.max_number_of_trains()
        );
        let cars = self.number_of_cars();
        for (index, train) in self.trains.iter_mut().enumerate() {
            let length = if index < number { cars } else { 0 };
            train.set_length(length, world, self.id, index as u8);
        }
        self.spread_trains();
    }

    /// Give every train in use `number` cars.
    pub fn set_number_of_cars(&mut self, number: usize, world: &mut VoxelWorld) {
        assert!(
            (1..=self.max_number_of_cars()).contains(&number),
            "{number} cars per train outside 1..={}",
            self.max_number_of_cars()
        );
        let used = self.number_of_trains();
        for (index, train) in self.trains.iter_mut().take(used).enumerate() {
            train.set_length(number, world, self.id, index as u8);
        }
    }

    fn spread_trains(&mut self) {
        let used = self.number_of_trains().max(1) as u64;
        let length = self.track.as_ref().map_or(0, |t| u64::from(t.length()));
        for (index, train) in self.trains.iter_mut().enumerate() {
            let position = (length * index as u64 / used) as u32;
            train.place_at(self.track.as_ref(), position);
        }
    }

    /// Advance every train by `delay` milliseconds.
    pub fn on_animate(&mut self, delay: u32, world: &mut VoxelWorld) {
        let Some(track) = &self.track else {
            return;
        };
        for (index, train) in self.trains.iter_mut().enumerate() {
            if !train.is_used() {
                break;
            }
            train.on_animate(delay, track, &self.car_type, world, self.id, index as u8);
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Open a closed ride. The first opening starts the breakdown countdown.
    pub fn open(&mut self, rng: &mut SimRng) -> Result<(), RideStateError> {
        if self.state != RideState::Closed {
            return Err(RideStateError::InvalidTransition {
                action: "open",
                state: self.state,
            });
        }
        self.set_state(RideState::Open);
        if self.breakdown == BreakdownState::Unopened {
            self.breakdown = BreakdownState::WillBreak {
                days: rng.exponential(self.reliability) + BREAKDOWN_GRACE_PERIOD,
            };
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), RideStateError> {
        match self.state {
            RideState::Testing | RideState::Open | RideState::Closed => {
                self.set_state(RideState::Closed);
                Ok(())
            }
            state => Err(RideStateError::InvalidTransition {
                action: "close",
                state,
            }),
        }
    }

    /// Return to building; the loop has to be assembled again afterwards.
    pub fn build(&mut self) -> Result<(), RideStateError> {
        if self.state == RideState::Open {
            return Err(RideStateError::InvalidTransition {
                action: "build",
                state: self.state,
            });
        }
        self.set_state(RideState::Building);
        self.track = None;
        Ok(())
    }

    /// Daily breakdown bookkeeping; only open rides age.
    pub fn on_new_day(&mut self, rng: &mut SimRng) {
        if self.state != RideState::Open {
            return;
        }
        self.breakdown = match self.breakdown {
            BreakdownState::NeedsNewCountdown => BreakdownState::WillBreak {
                days: rng.exponential(self.reliability),
            },
            BreakdownState::WillBreak { days } => BreakdownState::WillBreak { days: days - 1 },
            other => other,
        };
        if let BreakdownState::WillBreak { days } = self.breakdown {
            if days <= 0 {
                self.breakdown = BreakdownState::Broken;
                warn!("Ride '{}' has broken down", self.name);
                self.notifications
                    .push(RideNotification::BrokenDown { ride: self.id });
            }
        }
    }

    /// Fix a broken ride. Returns whether it was broken.
    pub fn repair(&mut self) -> bool {
        if self.breakdown != BreakdownState::Broken {
            return false;
        }
        self.breakdown = BreakdownState::NeedsNewCountdown;
        true
    }

    // -------------------------------------------------------------------------
    // Guests
    // -------------------------------------------------------------------------

    /// Coasters do not take guests yet.
    pub fn enter_ride(&mut self, _guest: u32, _entry_edge: u8) -> RideEntryResult {
        RideEntryResult::Refused
    }

    pub fn exit_for(&self, _guest: u32, _entry_edge: u8) -> Option<Point3> {
        None
    }

    /// Evict every guest; returns how many left.
    pub fn remove_all_people(&mut self) -> usize {
        0
    }

    /// Edges of `voxel` with an entrance, one bit per edge.
    pub fn entrance_directions(&self, _voxel: Point3) -> u8 {
        0
    }

    pub fn can_be_visited(&self, voxel: Point3, edge: u8) -> bool {
        self.state == RideState::Open && self.entrance_directions(voxel) & (1 << (edge & 3)) != 0
    }

    // -------------------------------------------------------------------------
    // Display
    // -------------------------------------------------------------------------

    /// Sprites of a track voxel for view orientation `view`: platform
    /// background, track behind, track in front and platform foreground.
    ///
    /// `data` is the voxel instance data written when the piece was placed.
    pub fn ride_layers(&self, data: u16, view: u8, catalog: &Catalog) -> [Option<SpriteId>; 4] {
        let (index, orientation) = unpack_voxel_data(data);
        let Some(tv) = self.coaster_type.track_voxel(index) else {
            debug_assert!(false, "ride '{}' has no track voxel {index}", self.name);
            return [None; 4];
        };
        let view = view & 3;
        let turns = orientation.quarter_turns();
        let local_view = usize::from((view + 4 - turns) & 3);
        let (back, front) = (tv.back[local_view], tv.front[local_view]);
        let mut layers = [None, back, front, None];

        if (back.is_some() || front.is_some()) && tv.has_platform {
            if let Some(platform) = catalog.platform(self.coaster_type.platform_type) {
                let edge = ((tv.platform_direction & 3) + turns + 4 - view) & 3;
                let (background, foreground) = platform.sprites_for_edge(edge);
                layers[0] = background;
                layers[3] = foreground;
            }
        }
        layers
    }

    /// Take everything this ride put into the world back out.
    pub fn release(&mut self, world: &mut VoxelWorld) {
        for (index, train) in self.trains.iter_mut().enumerate() {
            train.clear_display(world, self.id, index as u8);
        }
        for piece in self.pieces.drain() {
            for (_, voxel) in piece.voxels() {
                world.clear_instance_occupant(voxel, self.id);
            }
        }
        self.order.clear();
        self.track = None;
    }
}
