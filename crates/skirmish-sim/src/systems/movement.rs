//! Kinematic integration system.
//!
//! A minimal rigid-body stand-in: yaw rate chases the commanded turn rate,
//! thrust acts along the nose, braking acts against the velocity, and
//! sideways drift bleeds off so ships carve turns instead of sliding.

use hecs::World;

use skirmish_core::constants::{SIM_ANGULAR_RESPONSE, SIM_LATERAL_DRAG};
use skirmish_core::types::{flatten, normalize_angle, ControlOutput, ShipSpec, ShipState};

use crate::components::Controls;

/// Integrate every ship from its last control outputs.
pub fn run(world: &mut World, dt: f32) {
    for (_entity, (state, spec, controls)) in
        world.query_mut::<(&mut ShipState, &ShipSpec, &Controls)>()
    {
        integrate(state, spec, &controls.output, dt);
    }
}

pub fn integrate(state: &mut ShipState, spec: &ShipSpec, controls: &ControlOutput, dt: f32) {
    let turn = controls.turn.clamp(-1.0, 1.0);
    let response = (SIM_ANGULAR_RESPONSE * dt).min(1.0);
    state.angular_velocity += (turn * spec.turn_rate - state.angular_velocity) * response;
    state.yaw = normalize_angle(state.yaw + state.angular_velocity * dt);

    let forward = state.forward();
    let throttle = controls.throttle.clamp(-1.0, 1.0);
    let mut velocity = flatten(state.velocity);
    if throttle > 0.0 {
        let boost = if controls.boost { spec.boost_factor } else { 1.0 };
        velocity += forward * throttle * spec.acceleration * boost * dt;
    } else if throttle < 0.0 {
        let speed = velocity.length();
        let decel = (-throttle * spec.acceleration * dt).min(speed);
        velocity -= velocity.normalize_or_zero() * decel;
    }

    let lateral = velocity - forward * velocity.dot(forward);
    velocity -= lateral * (SIM_LATERAL_DRAG * dt).min(1.0);

    let cap = if controls.warp {
        spec.warp_speed
    } else if controls.boost {
        spec.max_speed * spec.boost_factor
    } else {
        spec.max_speed
    };
    state.velocity = velocity.clamp_length_max(cap);
    state.position = flatten(state.position + state.velocity * dt);
}
