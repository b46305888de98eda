//! ECS components attached to host entities.
//!
//! Ship entities carry: `Ship`, `ShipState`, `ShipSpec`, `Hull`,
//! `Allegiance`, `Loadout`, `Pilot`, `Controls`. Obstacles carry only
//! `Obstacle`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use skirmish_ai::{AgentController, FireIntent};
use skirmish_core::constants::{CAPITAL_RADIUS, FIGHTER_RADIUS};
use skirmish_core::enums::{Attitude, HardpointKind};
use skirmish_core::types::{BodyId, ControlOutput, ShipSpec};

/// Marker + stable handle for a ship entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ship {
    pub id: BodyId,
}

/// Hull integrity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hull {
    /// Fraction in [0, 1]; the ship is removed at 0.
    pub health: f32,
    pub last_hit_secs: Option<f64>,
}

impl Default for Hull {
    fn default() -> Self {
        Self {
            health: 1.0,
            last_hit_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Blue,
    Red,
    Neutral,
}

impl Side {
    /// How a ship on this side regards a ship on `other`.
    pub fn attitude_toward(self, other: Side) -> Attitude {
        match (self, other) {
            (Side::Neutral, _) | (_, Side::Neutral) => Attitude::Neutral,
            (a, b) if a == b => Attitude::Friend,
            _ => Attitude::Enemy,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Allegiance {
    pub side: Side,
    pub squad: Option<u32>,
}

/// One weapon mount and the range at which it reports "in range".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponMount {
    pub kind: HardpointKind,
    pub range: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loadout {
    pub mounts: Vec<WeaponMount>,
}

/// The agent brain flying this ship.
#[derive(Debug)]
pub struct Pilot(pub AgentController);

/// Last outputs of the agent, consumed by the movement system.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Controls {
    pub output: ControlOutput,
    pub fire: FireIntent,
}

/// Static spherical obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f32,
}

/// Collision radius used for ray casts against ships.
pub fn hull_radius(spec: &ShipSpec) -> f32 {
    if spec.is_capital {
        CAPITAL_RADIUS
    } else {
        FIGHTER_RADIUS
    }
}
