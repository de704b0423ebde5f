// ---------------------------------------------------------------------------
// Train movement: advance along the loop, apply gravity, pose every car
// ---------------------------------------------------------------------------

use crate::catalog::CarType;
use crate::config::{GRAVITY, MIN_CRAWL_SPEED};
use crate::coords::Point3;
use crate::track::TrackLoop;
use crate::voxel_world::{CarEnd, CarEndRef, RideId, VoxelWorld};

use super::orientation::{pitch_bucket, roll_bucket, unroll, yaw_bucket};
use super::types::{Car, CarPose, Train};

/// The result of advancing a train, computed before anything is written back.
#[derive(Debug, Clone)]
pub struct TrainStep {
    pub back_position: u32,
    pub cur_piece: usize,
    pub speed: i32,
    /// Back and front pose of every car, back car first.
    pub poses: Vec<(CarPose, CarPose)>,
}

/// A sample point on the loop, tracking the piece it was found on.
struct Cursor<'a> {
    track: &'a TrackLoop,
    position: u32,
    piece: usize,
}

impl Cursor<'_> {
    fn advance(&mut self, distance: u32) {
        self.position = self
            .track
            .wrap(i64::from(self.position) + i64::from(distance));
        self.piece = self.track.locate(self.piece, self.position, true);
    }

    fn sample(&self) -> (i32, i32, i32) {
        let piece = self.track.piece(self.piece);
        piece.car_position(self.position - piece.distance_base)
    }

    fn bank(&self) -> f64 {
        let piece = self.track.piece(self.piece);
        piece.bank(self.position - piece.distance_base)
    }
}

fn end_pose(
    (x, y, z): (i32, i32, i32),
    middle: Point3,
    pitch: u8,
    roll: u8,
    yaw: u8,
) -> CarPose {
    let voxel = Point3::new(x, y, z).to_voxel();
    CarPose {
        voxel,
        pixel: middle - voxel.to_sub_voxel(),
        pitch,
        roll,
        yaw,
    }
}

impl Train {
    /// Compute where the train will be after `delay` milliseconds.
    ///
    /// The train is not modified; see [`Train::apply`].
    pub fn simulate(&self, delay: u32, track: &TrackLoop, car_type: &CarType) -> TrainStep {
        let displacement = i64::from(self.speed) * i64::from(delay);
        let back_position = track.wrap(i64::from(self.back_position) + displacement);
        let cur_piece = track.locate(self.cur_piece, back_position, self.speed >= 0);
        let powered = {
            let piece = track.piece(cur_piece);
            piece.has_power() || piece.has_platform()
        };

        let half = car_type.car_length / 2;
        let mut speed = self.speed;
        let mut cursor = Cursor {
            track,
            position: back_position,
            piece: cur_piece,
        };
        let mut poses = Vec::with_capacity(self.cars.len());

        for _ in &self.cars {
            let back = cursor.sample();
            cursor.advance(half);
            let roll = roll_bucket(cursor.bank());
            cursor.advance(half);
            let front = cursor.sample();

            let xder = front.0 - back.0;
            let yder = front.1 - back.1;
            let zder = (front.2 - back.2) / 2;
            let middle = Point3::new(back.0 + xder / 2, back.1 + yder / 2, back.2 + zder);

            let total = (f64::from(xder).powi(2) + f64::from(yder).powi(2) + f64::from(zder).powi(2))
                .sqrt();
            if total > 0.0 {
                speed = (f64::from(speed) - f64::from(zder) / total * GRAVITY) as i32;
            }
            if powered && speed < MIN_CRAWL_SPEED {
                speed = MIN_CRAWL_SPEED;
            }

            let (yder, zder) = unroll(roll, yder, zder);
            let pitch = pitch_bucket(xder, yder, zder);
            let yaw = yaw_bucket(xder, yder);
            poses.push((
                end_pose(back, middle, pitch, roll, yaw),
                end_pose(front, middle, pitch, roll, yaw),
            ));

            cursor.advance(car_type.inter_car_length);
        }

        TrainStep {
            back_position,
            cur_piece,
            speed,
            poses,
        }
    }

    /// Commit a computed step: store the new position and speed and move every
    /// car end to its new pose.
    pub fn apply(&mut self, step: TrainStep, world: &mut VoxelWorld, ride: RideId, train: u8) {
        debug_assert_eq!(step.poses.len(), self.cars.len());
        self.back_position = step.back_position;
        self.cur_piece = step.cur_piece;
        self.speed = step.speed;
        for (index, (car, (back, front))) in self.cars.iter_mut().zip(step.poses).enumerate() {
            car.back.set(back, world, car_end(ride, train, index, CarEnd::Back));
            car.front.set(front, world, car_end(ride, train, index, CarEnd::Front));
        }
    }

    /// Advance the train by `delay` milliseconds along `track`.
    pub fn on_animate(
        &mut self,
        delay: u32,
        track: &TrackLoop,
        car_type: &CarType,
        world: &mut VoxelWorld,
        ride: RideId,
        train: u8,
    ) {
        if !self.is_used() || track.is_empty() {
            return;
        }
        let step = self.simulate(delay, track, car_type);
        self.apply(step, world, ride, train);
    }

    /// Resize the train to `cars` cars. Removed cars leave the world.
    pub fn set_length(&mut self, cars: usize, world: &mut VoxelWorld, ride: RideId, train: u8) {
        if cars < self.cars.len() {
            for (index, car) in self.cars.iter_mut().enumerate().skip(cars) {
                clear_car(car, world, ride, train, index);
            }
            self.cars.truncate(cars);
        } else {
            self.cars.resize_with(cars, Car::default);
        }
    }

    /// Put the train back at `position` on `track`, at rest.
    pub fn place_at(&mut self, track: Option<&TrackLoop>, position: u32) {
        self.speed = 0;
        match track {
            Some(track) if !track.is_empty() => {
                self.back_position = track.wrap(i64::from(position));
                self.cur_piece = track.locate(0, self.back_position, true);
            }
            _ => {
                self.back_position = 0;
                self.cur_piece = 0;
            }
        }
    }

    /// Remove every car end of this train from the world.
    pub fn clear_display(&mut self, world: &mut VoxelWorld, ride: RideId, train: u8) {
        for (index, car) in self.cars.iter_mut().enumerate() {
            clear_car(car, world, ride, train, index);
        }
    }
}

fn clear_car(car: &mut Car, world: &mut VoxelWorld, ride: RideId, train: u8, index: usize) {
    car.back.clear(world, car_end(ride, train, index, CarEnd::Back));
    car.front.clear(world, car_end(ride, train, index, CarEnd::Front));
}

fn car_end(ride: RideId, train: u8, car: usize, end: CarEnd) -> CarEndRef {
    CarEndRef {
        ride,
        train,
        car: car as u16,
        end,
    }
}

