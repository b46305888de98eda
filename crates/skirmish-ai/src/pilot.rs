//! Arrival and PD actuation.
//!
//! Turns "be over there, facing this way, at about this speed" into
//! bounded turn/throttle/boost outputs. Desired speed follows the
//! kinematic stopping distance so the ship brakes in time; heading is held
//! by a PD loop on yaw. A short-range closest-approach check bends the
//! desired velocity away from other ships.

use glam::Vec3;

use skirmish_core::constants::{DEFAULT_ARRIVAL_RADIUS, DEFAULT_SLOWDOWN_RADIUS, EPSILON};
use skirmish_core::types::{
    flatten, signed_angle, yaw_to_forward, BodyId, ControlOutput, ShipSpec, ShipState,
};

use crate::config::PilotTuning;
use crate::navigation::NavigationField;
use crate::world::WorldQuery;

/// What the pilot should do this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PilotCommand {
    pub target_position: Vec3,
    /// Heading to hold once arrived.
    pub target_orientation: Option<f32>,
    /// Upper bound on cruise speed; the hull's max speed still applies.
    pub desired_speed: f32,
    pub arrival_radius: f32,
    /// Distance at which the approach starts easing off. Zero disables.
    pub slowdown_radius: f32,
    /// Feed-forward velocity, e.g. the formation leader's.
    pub match_velocity: Option<Vec3>,
    pub force_boost: bool,
    pub warp: bool,
    /// Pick the travel direction from the navigation field.
    pub use_navigation: bool,
    /// Bodies ignored by navigation rays and collision avoidance.
    pub ignore: Vec<BodyId>,
}

impl PilotCommand {
    pub fn to(target_position: Vec3) -> Self {
        Self {
            target_position,
            target_orientation: None,
            desired_speed: f32::MAX,
            arrival_radius: DEFAULT_ARRIVAL_RADIUS,
            slowdown_radius: DEFAULT_SLOWDOWN_RADIUS,
            match_velocity: None,
            force_boost: false,
            warp: false,
            use_navigation: false,
            ignore: Vec::new(),
        }
    }

    pub fn speed(mut self, desired_speed: f32) -> Self {
        self.desired_speed = desired_speed;
        self
    }

    pub fn radii(mut self, arrival: f32, slowdown: f32) -> Self {
        self.arrival_radius = arrival;
        self.slowdown_radius = slowdown;
        self
    }

    pub fn facing(mut self, yaw: f32) -> Self {
        self.target_orientation = Some(yaw);
        self
    }

    pub fn matching(mut self, velocity: Vec3) -> Self {
        self.match_velocity = Some(velocity);
        self
    }

    pub fn boost(mut self, force: bool) -> Self {
        self.force_boost = force;
        self
    }

    pub fn navigated(mut self, on: bool) -> Self {
        self.use_navigation = on;
        self
    }

    pub fn ignoring(mut self, id: BodyId) -> Self {
        if !self.ignore.contains(&id) {
            self.ignore.push(id);
        }
        self
    }
}

/// Everything the pilot can see besides its own ship.
pub struct PilotSensors<'a> {
    pub self_id: BodyId,
    pub world: &'a dyn WorldQuery,
    pub navigation: Option<&'a mut NavigationField>,
}

/// Last-tick internals, for overlays and logs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PilotDebug {
    pub turn: f32,
    pub throttle: f32,
    pub boost: bool,
    pub distance: f32,
    pub angle_error_deg: f32,
    pub speed: f32,
    pub target_speed: f32,
    pub angular_velocity: f32,
    pub arrived: bool,
    pub avoiding: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PilotController {
    tuning: PilotTuning,
    arrived: bool,
    orientation_matched: bool,
    avoiding: bool,
    debug: PilotDebug,
}

impl PilotController {
    pub fn new(tuning: PilotTuning) -> Self {
        Self {
            tuning,
            ..Default::default()
        }
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    pub fn orientation_matched(&self) -> bool {
        self.orientation_matched
    }

    pub fn is_avoiding(&self) -> bool {
        self.avoiding
    }

    pub fn debug_info(&self) -> PilotDebug {
        self.debug
    }

    pub fn debug_string(&self) -> String {
        let d = &self.debug;
        format!(
            "TgtSpd:{:.1} CurSpd:{:.1} Thr:{:.2} Boost:{} Arrived:{}",
            d.target_speed, d.speed, d.throttle, d.boost, d.arrived
        )
    }

    /// Forget arrival and avoidance latches, e.g. after a new destination.
    pub fn reset(&mut self) {
        self.arrived = false;
        self.orientation_matched = false;
        self.avoiding = false;
    }

    /// Outputs for a tick without usable ship state.
    pub fn neutral(&mut self) -> ControlOutput {
        self.debug.turn = 0.0;
        self.debug.throttle = 0.0;
        self.debug.boost = false;
        ControlOutput::neutral()
    }

    pub fn update(
        &mut self,
        ship: &ShipState,
        spec: &ShipSpec,
        command: &PilotCommand,
        sensors: PilotSensors<'_>,
    ) -> ControlOutput {
        let forward = ship.forward();
        let speed = ship.speed();
        let top_speed = if command.warp {
            spec.warp_speed
        } else {
            spec.max_speed
        };

        let to_target = flatten(command.target_position - ship.position);
        let distance = to_target.length();

        // Speed we can still shed before the target.
        let braking_limit =
            self.tuning.braking_safety * (2.0 * spec.acceleration * distance).sqrt();
        let mut target_speed = command.desired_speed.min(top_speed).min(braking_limit);
        if command.slowdown_radius > 0.0 && distance < command.slowdown_radius {
            target_speed *= distance / command.slowdown_radius;
        }

        if self.arrived {
            if distance > command.arrival_radius * self.tuning.arrival_hysteresis {
                self.arrived = false;
            }
        } else if distance < command.arrival_radius && speed < self.tuning.arrival_speed {
            self.arrived = true;
        }
        if self.arrived {
            target_speed = 0.0;
        }

        let route_min_distance = command.slowdown_radius.max(command.arrival_radius);
        let direction = match sensors.navigation {
            // Final approach flies straight at the point.
            Some(field) if command.use_navigation && distance > route_min_distance => field.best_direction(
                ship,
                command.target_position,
                sensors.self_id,
                &command.ignore,
                speed,
                sensors.world,
            ),
            _ => to_target.normalize_or_zero(),
        };

        let mut desired_velocity = direction * target_speed;
        if let Some(matched) = command.match_velocity {
            let matched = flatten(matched);
            if matched.length_squared() > 0.1 {
                desired_velocity = (desired_velocity + matched)
                    .clamp_length_max(spec.max_speed * self.tuning.feed_forward_limit);
            }
        }

        desired_velocity = self.avoid_collisions(
            ship,
            spec.max_speed,
            desired_velocity,
            &command.ignore,
            sensors.self_id,
            sensors.world,
        );

        // Heading: explicit orientation once parked, else along the velocity.
        let heading = match command.target_orientation {
            Some(yaw) if self.arrived && desired_velocity.length() < 1.0 => yaw_to_forward(yaw),
            _ if desired_velocity.length_squared() < 0.1 => forward,
            _ => desired_velocity.normalize_or_zero(),
        };

        let angle_error = signed_angle(forward, heading);
        let agility = if spec.is_capital {
            self.tuning.capital_agility
        } else {
            1.0
        };
        let turn = (self.tuning.rotation_kp * agility * angle_error
            - self.tuning.rotation_kd * ship.angular_velocity)
            .clamp(-1.0, 1.0);

        self.orientation_matched = angle_error.abs()
            < self.tuning.orientation_tolerance_deg.to_radians()
            && ship.angular_velocity.abs() < 0.1;

        let forward_speed = ship.forward_speed();
        let speed_error = desired_velocity.dot(forward) - forward_speed;
        let mut throttle = (speed_error / self.tuning.throttle_gain_speed).clamp(-1.0, 1.0);

        // Do not thrust while still swinging onto the heading.
        if angle_error.abs() > self.tuning.turn_gate_deg.to_radians() && throttle > 0.0 {
            throttle = 0.0;
        }

        let boost = (speed_error > self.tuning.boost_speed_error && throttle > 0.9)
            || command.force_boost;

        if throttle < 0.0 && forward_speed > self.tuning.full_brake_speed {
            throttle = -1.0;
        }

        self.debug = PilotDebug {
            turn,
            throttle,
            boost,
            distance,
            angle_error_deg: angle_error.to_degrees(),
            speed,
            target_speed,
            angular_velocity: ship.angular_velocity,
            arrived: self.arrived,
            avoiding: self.avoiding,
        };

        ControlOutput {
            turn,
            throttle,
            boost,
            warp: command.warp,
        }
    }

    /// Blend an escape heading into `desired` when another ship's closest
    /// approach comes too near. Engages inside the danger radius and holds
    /// until the miss distance clears the outer radius.
    fn avoid_collisions(
        &mut self,
        ship: &ShipState,
        max_speed: f32,
        desired: Vec3,
        ignore: &[BodyId],
        self_id: BodyId,
        world: &dyn WorldQuery,
    ) -> Vec3 {
        let t = &self.tuning;
        let mut closest: Option<(f32, Vec3)> = None;

        for other in world.neighbors() {
            if other.id == self_id || ignore.contains(&other.id) {
                continue;
            }
            let rel_pos = flatten(other.position - ship.position);
            let rel_vel = flatten(other.velocity - ship.velocity);
            let rel_speed_sq = rel_vel.length_squared();
            if rel_speed_sq < EPSILON {
                continue;
            }
            let range = rel_pos.length();
            if range > EPSILON && -rel_pos.dot(rel_vel) / range < t.avoid_min_closing_speed {
                continue;
            }
            let time = (-rel_pos.dot(rel_vel) / rel_speed_sq).clamp(0.0, t.avoid_lookahead_secs);
            let miss = (rel_pos + rel_vel * time).length();
            if closest.map_or(true, |(best, _)| miss < best) {
                closest = Some((miss, rel_pos));
            }
        }

        let threshold = if self.avoiding {
            t.avoid_radius
        } else {
            t.avoid_danger_radius
        };
        let Some((miss, rel_pos)) = closest.filter(|(miss, _)| *miss < threshold) else {
            self.avoiding = false;
            return desired;
        };
        self.avoiding = true;

        let forward = ship.forward();
        let away = (-rel_pos).try_normalize().unwrap_or(-forward);
        let side = away.cross(Vec3::Y);
        let perpendicular = if side.dot(forward) >= 0.0 { side } else { -side };
        let escape = (away * 0.4 + perpendicular * 0.6).try_normalize().unwrap_or(away);

        let band = (t.avoid_radius - t.avoid_danger_radius).max(EPSILON);
        let urgency = ((t.avoid_radius - miss) / band).clamp(0.0, 1.0);
        desired * (1.0 - urgency) + escape * max_speed * urgency
    }
}
