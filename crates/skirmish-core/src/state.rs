//! Battle snapshot: the visible state handed to diagnostics and UI each tick.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::AgentEvent;
use crate::types::{BodyId, ControlOutput, SimTime};

/// Complete battle state after a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub time: SimTime,
    pub agents: Vec<AgentView>,
    pub obstacles: Vec<ObstacleView>,
    pub events: Vec<AgentEvent>,
}

impl BattleSnapshot {
    pub fn agent(&self, id: BodyId) -> Option<&AgentView> {
        self.agents.iter().find(|a| a.id == id)
    }
}

/// One agent as seen by diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentView {
    pub id: BodyId,
    pub squad: Option<u32>,
    pub attitude: Attitude,
    pub position: Vec3,
    pub yaw: f32,
    pub speed: f32,
    pub health: f32,
    pub state: AiState,
    pub phase: TacticalPhase,
    pub tactic: TacticalPosition,
    pub target: Option<BodyId>,
    pub arrived: bool,
    pub controls: ControlOutput,
    /// Pilot debug line plus the current thought.
    pub debug: String,
    /// Most recent decisions, oldest first, already formatted.
    pub recent_decisions: Vec<String>,
}

/// A static spherical obstacle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstacleView {
    pub center: Vec3,
    pub radius: f32,
}
