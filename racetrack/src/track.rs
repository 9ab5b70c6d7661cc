//! A car driving laps around an annular track.
//!
//! The track is the ring between two circles centred on the origin.
//! Cars start on the middle circle facing counter-clockwise, which is
//! the direction that earns fitness.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

/// Network inputs per car: five rangefinders, speed and acceleration.
pub const SENSOR_COUNT: usize = 7;

const RAY_ANGLES: [f32; 5] = [0.0, FRAC_PI_4, -FRAC_PI_4, FRAC_PI_2, -FRAC_PI_2];
const RAY_STEP: f32 = 0.05;

/// Track geometry and car handling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Seconds simulated per tick.
    pub time_step: f32,
    pub max_speed: f32,
    /// Speed gained per second under throttle.
    pub acceleration: f32,
    /// Speed lost per second while coasting.
    pub deceleration: f32,
    /// Fraction of a right angle turned per tick at full steering.
    pub turn_speed: f32,
    /// Rangefinders report 1 beyond this distance.
    pub max_ray_distance: f32,
    /// A car dies if it gains less than `stall_progress`
    /// distance units within this many ticks.
    pub stall_window: usize,
    pub stall_progress: f32,
}

impl Default for Track {
    fn default() -> Track {
        Track {
            inner_radius: 20.0,
            outer_radius: 30.0,
            time_step: 0.02,
            max_speed: 11.4,
            acceleration: 5.0,
            deceleration: 2.0,
            turn_speed: 0.02,
            max_ray_distance: 10.0,
            stall_window: 500,
            stall_progress: 2.0,
        }
    }
}

impl Track {
    pub fn mid_radius(&self) -> f32 {
        (self.inner_radius + self.outer_radius) / 2.0
    }

    pub fn contains(&self, [x, y]: [f32; 2]) -> bool {
        let r = x.hypot(y);
        r >= self.inner_radius && r <= self.outer_radius
    }

    /// Distance to the nearest wall along `direction`, scaled
    /// to [0, 1] by the maximum ray distance.
    fn range(&self, [x, y]: [f32; 2], direction: f32) -> f32 {
        let (dy, dx) = direction.sin_cos();
        let mut travelled = 0.0;
        while travelled < self.max_ray_distance {
            travelled += RAY_STEP;
            if !self.contains([x + dx * travelled, y + dy * travelled]) {
                return (travelled / self.max_ray_distance).min(1.0);
            }
        }
        1.0
    }
}

/// Why a car's episode ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Death {
    Crashed,
    Stalled,
    OutOfTime,
}

#[derive(Clone, Debug)]
pub struct Car {
    position: [f32; 2],
    heading: f32,
    speed: f32,
    last_speed: f32,
    acceleration: f32,
    last_angle: f32,
    /// Signed angle swept around the centre, in radians.
    progress: f32,
    ticks: usize,
    window_start: f32,
}

impl Car {
    /// Places a car on the middle circle at `angle`,
    /// facing counter-clockwise.
    pub fn spawn(track: &Track, angle: f32) -> Car {
        let (sin, cos) = angle.sin_cos();
        let r = track.mid_radius();
        Car {
            position: [r * cos, r * sin],
            heading: angle + FRAC_PI_2,
            speed: 0.0,
            last_speed: 0.0,
            acceleration: 0.0,
            last_angle: angle,
            progress: 0.0,
            ticks: 0,
            window_start: 0.0,
        }
    }

    /// Distance driven around the track, negative when
    /// driving the wrong way.
    pub fn fitness(&self, track: &Track) -> f32 {
        self.progress * track.mid_radius()
    }

    pub fn sensors(&self, track: &Track) -> [f32; SENSOR_COUNT] {
        let mut inputs = [0.0; SENSOR_COUNT];
        for (input, angle) in inputs.iter_mut().zip(RAY_ANGLES) {
            *input = track.range(self.position, self.heading + angle);
        }
        inputs[5] = self.speed / track.max_speed;
        inputs[6] = self.acceleration / track.acceleration;
        inputs
    }

    /// Advances the car by one tick. Positive `throttle` speeds up
    /// forwards, negative speeds up backwards at half the top speed,
    /// and zero coasts. `steering` turns left for positive values.
    pub fn drive(&mut self, throttle: f32, steering: f32, track: &Track) {
        let dt = track.time_step;
        let (target, rate) = if throttle > 0.0 {
            (track.max_speed, track.acceleration)
        } else if throttle < 0.0 {
            (-track.max_speed / 2.0, track.acceleration)
        } else {
            (0.0, track.deceleration)
        };
        self.last_speed = self.speed;
        self.speed = move_towards(self.speed, target, rate * dt);
        self.acceleration = (self.speed - self.last_speed) / dt;

        let (dy, dx) = self.heading.sin_cos();
        self.position[0] += dx * self.speed * dt;
        self.position[1] += dy * self.speed * dt;
        if self.speed != 0.0 {
            self.heading += steering * FRAC_PI_2 * track.turn_speed;
        }

        let angle = self.position[1].atan2(self.position[0]);
        self.progress += wrap_angle(angle - self.last_angle);
        self.last_angle = angle;
        self.ticks += 1;
    }

    /// Returns why the car should die, if it should.
    pub fn death(&mut self, track: &Track, max_ticks: usize) -> Option<Death> {
        if !track.contains(self.position) {
            return Some(Death::Crashed);
        }
        if self.ticks >= max_ticks {
            return Some(Death::OutOfTime);
        }
        if track.stall_window > 0 && self.ticks % track.stall_window == 0 {
            let gained = self.fitness(track) - self.window_start;
            if gained < track.stall_progress {
                return Some(Death::Stalled);
            }
            self.window_start = self.fitness(track);
        }
        None
    }
}

/// Every car of a generation, one per individual.
pub struct Race {
    track: Track,
    cars: Vec<Car>,
}

impl Race {
    pub fn new(track: Track, car_count: usize, spawn_angle: f32) -> Race {
        let cars = vec![Car::spawn(&track, spawn_angle); car_count];
        Race { track, cars }
    }

    pub fn cars_mut(&mut self) -> (&Track, &mut [Car]) {
        (&self.track, &mut self.cars)
    }

    /// Sensor readings of every car, in car order.
    pub fn sensors(&self) -> Vec<[f32; SENSOR_COUNT]> {
        self.cars
            .par_iter()
            .map(|car| car.sensors(&self.track))
            .collect()
    }

    /// Puts every car back at the start line.
    pub fn restart(&mut self, spawn_angle: f32) {
        for car in &mut self.cars {
            *car = Car::spawn(&self.track, spawn_angle);
        }
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(target - current)
    }
}

/// Maps an angle difference into (-PI, PI].
fn wrap_angle(mut delta: f32) -> f32 {
    while delta > PI {
        delta -= TAU;
    }
    while delta <= -PI {
        delta += TAU;
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_faces_along_track() {
        let track = Track::default();
        let car = Car::spawn(&track, 0.0);
        assert_eq!(car.position, [25.0, 0.0]);
        let sensors = car.sensors(&track);
        // Straight ahead is open track, the walls are 5 units to either side.
        assert!(sensors[0] > 0.9);
        assert!((sensors[3] - 0.5).abs() < 0.01);
        assert!((sensors[4] - 0.5).abs() < 0.01);
        assert_eq!(sensors[5], 0.0);
        assert_eq!(sensors[6], 0.0);
    }

    #[test]
    fn throttle_accelerates_towards_max() {
        let track = Track::default();
        let mut car = Car::spawn(&track, 0.0);
        car.drive(1.0, 0.0, &track);
        assert!((car.speed - 0.1).abs() < 1e-6);
        assert!((car.sensors(&track)[6] - 1.0).abs() < 1e-4);
        for _ in 0..1000 {
            car.drive(1.0, 0.0, &track);
        }
        assert_eq!(car.speed, track.max_speed);
    }

    #[test]
    fn reverse_is_capped_at_half_speed() {
        let track = Track::default();
        let mut car = Car::spawn(&track, 0.0);
        for _ in 0..1000 {
            car.drive(-1.0, 0.0, &track);
        }
        assert_eq!(car.speed, -track.max_speed / 2.0);
    }

    #[test]
    fn driving_forward_earns_fitness() {
        let track = Track::default();
        let mut car = Car::spawn(&track, 0.0);
        for _ in 0..50 {
            car.drive(1.0, 0.0, &track);
        }
        assert!(car.fitness(&track) > 0.0);
        assert_eq!(car.death(&track, 1000), None);
    }

    #[test]
    fn driving_straight_crashes() {
        let track = Track::default();
        let mut car = Car::spawn(&track, 0.0);
        let mut death = None;
        for _ in 0..10_000 {
            car.drive(1.0, 0.0, &track);
            death = car.death(&track, usize::MAX);
            if death.is_some() {
                break;
            }
        }
        assert_eq!(death, Some(Death::Crashed));
    }

    #[test]
    fn idle_car_stalls_or_times_out() {
        let track = Track::default();
        let mut car = Car::spawn(&track, 1.0);
        let mut death = None;
        for _ in 0..track.stall_window {
            car.drive(0.0, 0.0, &track);
            death = car.death(&track, usize::MAX);
        }
        assert_eq!(death, Some(Death::Stalled));

        let mut car = Car::spawn(&track, 1.0);
        car.drive(0.0, 0.0, &track);
        assert_eq!(car.death(&track, 1), Some(Death::OutOfTime));
    }

    #[test]
    fn progress_wraps_around_the_start() {
        let track = Track::default();
        let mut car = Car::spawn(&track, PI - 0.01);
        let (sin, cos) = (-PI + 0.01).sin_cos();
        car.position = [track.mid_radius() * cos, track.mid_radius() * sin];
        car.drive(0.0, 0.0, &track);
        assert!((car.progress - 0.02).abs() < 1e-4);
    }

    #[test]
    fn race_sensors_per_car() {
        let race = Race::new(Track::default(), 4, 0.0);
        let sensors = race.sensors();
        assert_eq!(sensors.len(), 4);
        assert!(sensors.iter().all(|s| *s == sensors[0]));
    }

    #[test]
    fn wrap_angle_range() {
        assert!((wrap_angle(TAU - 0.1) + 0.1).abs() < 1e-5);
        assert!((wrap_angle(-TAU + 0.1) - 0.1).abs() < 1e-5);
        assert_eq!(wrap_angle(PI), PI);
    }
}
