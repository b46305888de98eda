//! Diagnostic events emitted by agents for logs and UI feedback.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::BodyId;

/// Something noteworthy an agent did this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgentEvent {
    /// The decision engine switched the agent's state.
    DecisionMade {
        agent: BodyId,
        state: AiState,
        reason: String,
        score: f32,
    },
    /// The tracked target became invalid and was dropped.
    TargetLost { agent: BodyId, target: BodyId },
    /// Range collapsed and the agent is breaking away.
    BreakAwayStarted { agent: BodyId, range: f32 },
    /// Breakaway finished.
    BreakAwayEnded { agent: BodyId },
    /// Evasion maneuver started.
    EvasionStarted {
        agent: BodyId,
        direction: Vec3,
        duration_secs: f32,
    },
    /// Evasion timed out and the agent resumed its attack.
    EvasionEnded { agent: BodyId },
    /// Attack-run sub-phase changed.
    PhaseChanged {
        agent: BodyId,
        from: TacticalPhase,
        to: TacticalPhase,
    },
}

impl AgentEvent {
    pub fn agent(&self) -> BodyId {
        match self {
            AgentEvent::DecisionMade { agent, .. }
            | AgentEvent::TargetLost { agent, .. }
            | AgentEvent::BreakAwayStarted { agent, .. }
            | AgentEvent::BreakAwayEnded { agent }
            | AgentEvent::EvasionStarted { agent, .. }
            | AgentEvent::EvasionEnded { agent }
            | AgentEvent::PhaseChanged { agent, .. } => *agent,
        }
    }
}
