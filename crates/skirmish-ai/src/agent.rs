//! AI-owned per-agent state.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use skirmish_core::constants::DEFAULT_ATTACK_DISTANCE;
use skirmish_core::enums::{AiState, FormationPattern, TacticalPhase, TacticalPosition};
use skirmish_core::types::BodyId;

/// A formation slot on a leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationAssignment {
    pub leader: BodyId,
    pub slot: usize,
    pub pattern: FormationPattern,
}

/// A running breakaway maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakaway {
    pub direction: Vec3,
    pub remaining_secs: f32,
}

/// Mutable AI fields of one agent. The physical side comes from the host
/// every tick and is not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: BodyId,
    pub state: AiState,
    pub target: Option<BodyId>,
    pub target_position: Vec3,
    pub target_orientation: Option<f32>,
    pub phase: TacticalPhase,
    pub tactic: TacticalPosition,
    pub attack_distance: f32,
    /// Countdown reused by whichever phase or state is running.
    pub state_timer: f32,
    pub breakaway: Option<Breakaway>,
    pub evasion_direction: Vec3,
    pub warp_target: Vec3,
    pub formation: Option<FormationAssignment>,
}

impl Agent {
    pub fn new(id: BodyId) -> Self {
        Self {
            id,
            state: AiState::Idle,
            target: None,
            target_position: Vec3::ZERO,
            target_orientation: None,
            phase: TacticalPhase::Approach,
            tactic: TacticalPosition::Direct,
            attack_distance: DEFAULT_ATTACK_DISTANCE,
            state_timer: 0.0,
            breakaway: None,
            evasion_direction: Vec3::ZERO,
            warp_target: Vec3::ZERO,
            formation: None,
        }
    }

    pub fn is_breaking_away(&self) -> bool {
        self.breakaway.is_some()
    }

    /// State to fall back to when the target disappears.
    pub fn fallback_state(&self) -> AiState {
        if self.formation.is_some() {
            AiState::Formation
        } else {
            AiState::Idle
        }
    }
}
