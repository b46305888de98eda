//! Utility decision layer.
//!
//! Every reaction interval all considerations are scored and the best one
//! is a candidate. A fresh decision is held for a commitment period during
//! which only a critical or clearly better suggestion can interrupt it.

use std::collections::VecDeque;
use std::fmt;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use skirmish_core::commands::SquadOrder;
use skirmish_core::enums::{AiState, TacticalPosition};

use crate::agent::Agent;
use crate::config::DecisionTuning;
use crate::considerations::{
    AggressiveConsideration, EvasionConsideration, LowHealthConsideration,
    SquadOrderConsideration,
};

/// What a consideration can see besides the agent itself.
#[derive(Debug, Clone, Default)]
pub struct Situation {
    pub now_secs: f64,
    /// Hull fraction in [0, 1].
    pub health: f32,
    pub last_hit_secs: Option<f64>,
    pub target_distance: Option<f32>,
    pub order: SquadOrder,
}

/// Output of one consideration. A score of 0 abstains.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub score: f32,
    pub reason: String,
    pub suggested_state: AiState,
    pub suggested_tactic: Option<TacticalPosition>,
    pub suggested_position: Option<Vec3>,
}

impl EvaluationResult {
    pub fn none() -> Self {
        Self {
            score: 0.0,
            reason: String::new(),
            suggested_state: AiState::Idle,
            suggested_tactic: None,
            suggested_position: None,
        }
    }

    pub fn suggest(score: f32, reason: impl Into<String>, state: AiState) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            reason: reason.into(),
            suggested_state: state,
            suggested_tactic: None,
            suggested_position: None,
        }
    }

    pub fn with_tactic(mut self, tactic: TacticalPosition) -> Self {
        self.suggested_tactic = Some(tactic);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.suggested_position = Some(position);
        self
    }
}

/// A stateless scoring rule.
pub trait Consideration: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, agent: &Agent, situation: &Situation) -> EvaluationResult;
}

/// One state switch, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp_secs: f64,
    pub action: AiState,
    pub reason: String,
    pub score: f32,
}

impl fmt::Display for DecisionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.1}s] {:?}: {} (score {:.2})",
            self.timestamp_secs, self.action, self.reason, self.score
        )
    }
}

/// Bounded history; the oldest record is evicted first.
#[derive(Debug, Clone)]
pub struct DecisionLog {
    records: VecDeque<DecisionRecord>,
    capacity: usize,
}

impl DecisionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, record: DecisionRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DecisionRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&DecisionRecord> {
        self.records.back()
    }
}

pub struct DecisionEngine {
    considerations: Vec<Box<dyn Consideration>>,
    tuning: DecisionTuning,
    thinking_timer: f32,
    commitment_timer: f32,
    committed_score: f32,
    thought: String,
    log: DecisionLog,
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.considerations.iter().map(|c| c.name()).collect();
        f.debug_struct("DecisionEngine")
            .field("considerations", &names)
            .field("commitment_timer", &self.commitment_timer)
            .field("committed_score", &self.committed_score)
            .field("thought", &self.thought)
            .finish()
    }
}

impl DecisionEngine {
    /// Engine with the four standard considerations.
    pub fn new(tuning: DecisionTuning) -> Self {
        Self::with_considerations(
            tuning,
            vec![
                Box::new(LowHealthConsideration),
                Box::new(AggressiveConsideration),
                Box::new(EvasionConsideration),
                Box::new(SquadOrderConsideration),
            ],
        )
    }

    pub fn with_considerations(
        tuning: DecisionTuning,
        considerations: Vec<Box<dyn Consideration>>,
    ) -> Self {
        let log = DecisionLog::new(tuning.log_capacity);
        Self {
            considerations,
            tuning,
            thinking_timer: 0.0,
            commitment_timer: 0.0,
            committed_score: 0.0,
            thought: "Thinking...".to_string(),
            log,
        }
    }

    pub fn history(&self) -> &DecisionLog {
        &self.log
    }

    pub fn current_thought(&self) -> &str {
        &self.thought
    }

    pub fn committed_score(&self) -> f32 {
        self.committed_score
    }

    pub fn commitment_remaining(&self) -> f32 {
        self.commitment_timer.max(0.0)
    }

    /// Drop any commitment, e.g. after an externally forced state.
    pub fn reset_commitment(&mut self) {
        self.commitment_timer = 0.0;
        self.committed_score = 0.0;
    }

    /// Think if the reaction interval has elapsed. Returns the winning
    /// result when it switched the agent's state.
    pub fn tick<R: Rng>(
        &mut self,
        agent: &mut Agent,
        situation: &Situation,
        dt: f32,
        rng: &mut R,
    ) -> Option<EvaluationResult> {
        self.thinking_timer -= dt;
        self.commitment_timer -= dt;
        if self.thinking_timer > 0.0 {
            return None;
        }
        self.thinking_timer = rng.gen_range(self.tuning.reaction_min..=self.tuning.reaction_max);

        let (best, support) = self.rank(agent, situation);
        if self.commitment_timer <= 0.0 {
            // Out of the window the bar is whatever still backs the current state.
            self.committed_score = support;
        }
        let best = best?;

        let committed = self.commitment_timer > 0.0;
        let should_switch = if committed {
            (best.score > self.tuning.critical_score && best.score > self.committed_score)
                || best.score > self.committed_score + self.tuning.override_margin
        } else {
            best.score >= self.committed_score
        };
        let changes_state = best.suggested_state != agent.state;

        let mut switched = None;
        if should_switch && changes_state {
            agent.state = best.suggested_state;
            if let Some(tactic) = best.suggested_tactic {
                agent.tactic = tactic;
            }
            if let Some(position) = best.suggested_position {
                agent.target_position = position;
            }
            self.commitment_timer =
                rng.gen_range(self.tuning.commit_min..=self.tuning.commit_max);
            self.committed_score = best.score;

            let record = DecisionRecord {
                timestamp_secs: situation.now_secs,
                action: best.suggested_state,
                reason: best.reason.clone(),
                score: best.score,
            };
            info!(agent = %agent.id, "decision {record}");
            self.log.push(record);
            switched = Some(best.clone());
        } else if !changes_state {
            self.committed_score = best.score;
        }

        self.thought = format!("{} ({:.2})", best.reason, best.score);
        if self.commitment_timer > 0.0 {
            self.thought
                .push_str(&format!(" [Locked {:.1}s]", self.commitment_timer));
        }
        switched
    }

    /// Highest-scoring applicable result; ties go to the earlier consideration.
    pub fn evaluate(&self, agent: &Agent, situation: &Situation) -> Option<EvaluationResult> {
        self.rank(agent, situation).0
    }

    /// Best result plus the best score among results backing `agent.state`.
    fn rank(&self, agent: &Agent, situation: &Situation) -> (Option<EvaluationResult>, f32) {
        let mut best: Option<EvaluationResult> = None;
        let mut support = 0.0_f32;
        for consideration in &self.considerations {
            let result = consideration.evaluate(agent, situation);
            debug!(
                agent = %agent.id,
                consideration = consideration.name(),
                score = result.score,
                state = ?result.suggested_state,
                "scored"
            );
            if result.score <= 0.0 {
                continue;
            }
            if result.suggested_state == agent.state {
                support = support.max(result.score);
            }
            if best.as_ref().map_or(true, |b| result.score > b.score) {
                best = Some(result);
            }
        }
        (best, support)
    }
}
