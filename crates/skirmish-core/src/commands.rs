//! Orders and commands sent to agents from outside the AI core.
//!
//! Squad orders are read by the decision layer; agent commands set
//! target/state fields directly and are applied at the next tick boundary.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::BodyId;

/// Order issued by a squad coordinator to every member of a squad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SquadOrder {
    pub kind: OrderType,
    pub target: Option<BodyId>,
    pub position: Option<Vec3>,
}

impl SquadOrder {
    pub fn new(kind: OrderType) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn attack(target: BodyId) -> Self {
        Self {
            kind: OrderType::AttackTarget,
            target: Some(target),
            position: None,
        }
    }

    pub fn defend(position: Vec3) -> Self {
        Self {
            kind: OrderType::Defend,
            target: None,
            position: Some(position),
        }
    }
}

/// Direct commands accepted by an agent controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgentCommand {
    /// Fly to a position and stop.
    FlyTo { position: Vec3 },
    /// Fly to a position, stop, and face a heading.
    FlyToAndFace { position: Vec3, yaw: f32 },
    /// Trail behind another body.
    FollowTarget { target: BodyId },
    /// Take a formation slot on a leader.
    JoinFormation {
        leader: BodyId,
        slot: usize,
        pattern: FormationPattern,
    },
    /// Attack a body from a tactical position.
    AttackFrom {
        target: BodyId,
        tactic: TacticalPosition,
        distance: f32,
    },
    /// Set the state directly, clearing timers and breakaway.
    ForceState { state: AiState },
    /// Start an evasion maneuver, optionally away from a threat.
    EnterEvasion { threat: Option<BodyId> },
    /// High-speed travel to a position.
    WarpTo { position: Vec3 },
}
