//! Entity spawn factories for setting up the battle world.

use glam::Vec3;
use hecs::{Entity, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use skirmish_ai::AgentController;
use skirmish_core::enums::HardpointKind;
use skirmish_core::types::{BodyId, ShipSpec, ShipState};

use crate::components::*;

/// Everything needed to put a ship into the world.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipSetup {
    pub side: Side,
    pub position: Vec3,
    pub yaw: f32,
    pub spec: ShipSpec,
    pub mounts: Vec<WeaponMount>,
}

impl ShipSetup {
    /// Fighter with a forward gun and a missile rack.
    pub fn fighter(side: Side, position: Vec3, yaw: f32) -> Self {
        Self {
            side,
            position,
            yaw,
            spec: ShipSpec::fighter(),
            mounts: vec![
                WeaponMount {
                    kind: HardpointKind::Fixed,
                    range: 60.0,
                },
                WeaponMount {
                    kind: HardpointKind::Missile,
                    range: 200.0,
                },
            ],
        }
    }

    /// Capital ship with turrets only.
    pub fn capital(side: Side, position: Vec3, yaw: f32) -> Self {
        Self {
            side,
            position,
            yaw,
            spec: ShipSpec::capital(),
            mounts: vec![
                WeaponMount {
                    kind: HardpointKind::Turret,
                    range: 120.0,
                };
                2
            ],
        }
    }
}

/// Spawn a ship flown by `controller`.
pub fn spawn_ship(
    world: &mut World,
    id: BodyId,
    setup: ShipSetup,
    controller: AgentController,
) -> Entity {
    world.spawn((
        Ship { id },
        ShipState::at(setup.position, setup.yaw),
        setup.spec,
        Hull::default(),
        Allegiance {
            side: setup.side,
            squad: None,
        },
        Loadout {
            mounts: setup.mounts,
        },
        Pilot(controller),
        Controls::default(),
    ))
}

pub fn spawn_obstacle(world: &mut World, center: Vec3, radius: f32) -> Entity {
    world.spawn((Obstacle {
        center: Vec3::new(center.x, 0.0, center.z),
        radius,
    },))
}

/// Scatter `count` rocks in a disc around `center`, keeping them apart.
pub fn spawn_asteroid_field(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    center: Vec3,
    spread: f32,
    count: usize,
) {
    let mut placed: Vec<(Vec3, f32)> = Vec::with_capacity(count);
    let mut attempts = 0;
    while placed.len() < count && attempts < count * 20 {
        attempts += 1;
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = spread * rng.gen::<f32>().sqrt();
        let radius = rng.gen_range(4.0..12.0);
        let position = center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);
        let clear = placed
            .iter()
            .all(|(p, r)| p.distance(position) > r + radius + 10.0);
        if clear {
            placed.push((position, radius));
        }
    }
    for (position, radius) in placed {
        spawn_obstacle(world, position, radius);
    }
}
