//! Fundamental geometric and simulation types.
//!
//! Space is Y-up and agents move in the XZ plane. An agent with yaw `ψ`
//! faces `(-sin ψ, 0, -cos ψ)`; positive yaw is counter-clockwise seen
//! from above.

use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{BOOST_FACTOR, EPSILON, TICK_RATE, WARP_SPEED};

/// Opaque handle to a physical body owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kinematic state of a ship as reported by the physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Heading about +Y (radians).
    pub yaw: f32,
    /// Yaw rate (rad/s), positive turning left.
    pub angular_velocity: f32,
    pub mass: f32,
}

impl Default for ShipState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            angular_velocity: 0.0,
            mass: 1.0,
        }
    }
}

impl ShipState {
    pub fn at(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            ..Default::default()
        }
    }

    /// Unit forward vector.
    pub fn forward(&self) -> Vec3 {
        yaw_to_forward(self.yaw)
    }

    /// Unit right vector.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y)
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Signed speed along the forward vector.
    pub fn forward_speed(&self) -> f32 {
        self.velocity.dot(self.forward())
    }
}

/// Static performance envelope of a hull.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipSpec {
    /// Top speed (m/s).
    pub max_speed: f32,
    /// Linear acceleration (m/s²), also used as braking deceleration.
    pub acceleration: f32,
    /// Yaw rate at full turn input (rad/s).
    pub turn_rate: f32,
    /// Acceleration multiplier while boosting.
    pub boost_factor: f32,
    /// Cruise speed while warping (m/s).
    pub warp_speed: f32,
    /// Capital-class hulls turn sluggishly.
    pub is_capital: bool,
}

impl Default for ShipSpec {
    fn default() -> Self {
        Self::fighter()
    }
}

impl ShipSpec {
    pub fn fighter() -> Self {
        Self {
            max_speed: 20.0,
            acceleration: 10.0,
            turn_rate: 3.0,
            boost_factor: BOOST_FACTOR,
            warp_speed: WARP_SPEED,
            is_capital: false,
        }
    }

    pub fn capital() -> Self {
        Self {
            max_speed: 8.0,
            acceleration: 2.0,
            turn_rate: 0.6,
            boost_factor: BOOST_FACTOR,
            warp_speed: WARP_SPEED,
            is_capital: true,
        }
    }
}

/// Normalized actuator commands produced once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlOutput {
    /// Yaw command in [-1, 1]; positive turns left.
    pub turn: f32,
    /// Thrust command in [-1, 1]; negative brakes.
    pub throttle: f32,
    pub boost: bool,
    pub warp: bool,
}

impl ControlOutput {
    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Seconds per tick at the default tick rate.
    pub fn dt(&self) -> f64 {
        1.0 / TICK_RATE as f64
    }

    /// Advance by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}

/// Forward unit vector for a yaw angle.
pub fn yaw_to_forward(yaw: f32) -> Vec3 {
    Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Yaw angle that faces along `dir`. Returns `None` for a (planar) zero vector.
pub fn forward_to_yaw(dir: Vec3) -> Option<f32> {
    let flat = flatten(dir);
    if flat.length_squared() < EPSILON * EPSILON {
        return None;
    }
    Some((-flat.x).atan2(-flat.z))
}

/// Drop the vertical component.
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Rotate a local-frame vector by a yaw angle.
pub fn rotate_by_yaw(local: Vec3, yaw: f32) -> Vec3 {
    Quat::from_rotation_y(yaw) * local
}

/// Signed angle from `from` to `to` about +Y, in (-π, π]. Positive is a left turn.
pub fn signed_angle(from: Vec3, to: Vec3) -> f32 {
    from.cross(to).dot(Vec3::Y).atan2(from.dot(to))
}

/// Wrap an angle to (-π, π].
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = (angle + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
        - std::f32::consts::PI;
    if wrapped <= -std::f32::consts::PI {
        wrapped + std::f32::consts::TAU
    } else {
        wrapped
    }
}
