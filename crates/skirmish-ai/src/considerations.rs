//! Built-in considerations.
//!
//! Each one looks at the agent and its situation and either abstains
//! (score 0) or suggests a state with a fixed urgency.

use skirmish_core::constants::{HEALTH_CRITICAL, HEALTH_RECOVERED, UNDER_FIRE_WINDOW_SECS};
use skirmish_core::enums::{AiState, OrderType, TacticalPosition};

use crate::agent::Agent;
use crate::decision::{Consideration, EvaluationResult, Situation};

/// Retreat when badly hurt; keep retreating until half health.
#[derive(Debug, Default, Clone, Copy)]
pub struct LowHealthConsideration;

impl Consideration for LowHealthConsideration {
    fn name(&self) -> &'static str {
        "Self Preservation"
    }

    fn evaluate(&self, agent: &Agent, situation: &Situation) -> EvaluationResult {
        let health = situation.health;
        if health < HEALTH_CRITICAL {
            EvaluationResult::suggest(
                0.9,
                format!("Health critical ({:.0}%), retreating", health * 100.0),
                AiState::Retreat,
            )
        } else if health < HEALTH_RECOVERED && agent.state == AiState::Retreat {
            EvaluationResult::suggest(
                0.8,
                format!("Recovering ({:.0}%)", health * 100.0),
                AiState::Retreat,
            )
        } else {
            EvaluationResult::none()
        }
    }
}

/// Baseline urge to attack whatever we are locked on to.
#[derive(Debug, Default, Clone, Copy)]
pub struct AggressiveConsideration;

impl Consideration for AggressiveConsideration {
    fn name(&self) -> &'static str {
        "Aggression"
    }

    fn evaluate(&self, agent: &Agent, situation: &Situation) -> EvaluationResult {
        if agent.target.is_none() || situation.health < HEALTH_CRITICAL {
            return EvaluationResult::none();
        }
        let reason = match situation.target_distance {
            Some(d) => format!("Engaging target (dist {d:.0})"),
            None => "Engaging target".to_string(),
        };
        EvaluationResult::suggest(0.5, reason, AiState::AttackRun)
    }
}

/// Break off when recently hit.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvasionConsideration;

impl Consideration for EvasionConsideration {
    fn name(&self) -> &'static str {
        "Evasion"
    }

    fn evaluate(&self, _agent: &Agent, situation: &Situation) -> EvaluationResult {
        match situation.last_hit_secs {
            Some(hit) if situation.now_secs - hit < UNDER_FIRE_WINDOW_SECS => {
                EvaluationResult::suggest(0.7, "Taking fire, evasive", AiState::Evasion)
                    .with_tactic(TacticalPosition::Evade)
            }
            _ => EvaluationResult::none(),
        }
    }
}

/// Follow the squad's standing order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SquadOrderConsideration;

impl Consideration for SquadOrderConsideration {
    fn name(&self) -> &'static str {
        "Squad Orders"
    }

    fn evaluate(&self, agent: &Agent, situation: &Situation) -> EvaluationResult {
        let order = &situation.order;
        match order.kind {
            OrderType::FormUp => {
                EvaluationResult::suggest(0.95, "Order: form up", AiState::Formation)
            }
            OrderType::HoldFire => {
                EvaluationResult::suggest(0.95, "Order: hold fire", AiState::Idle)
            }
            OrderType::AttackTarget if order.target.is_some() || agent.target.is_some() => {
                EvaluationResult::suggest(0.85, "Order: attack target", AiState::AttackRun)
            }
            OrderType::Evasion => {
                EvaluationResult::suggest(0.95, "Order: evade", AiState::Evasion)
                    .with_tactic(TacticalPosition::Evade)
            }
            OrderType::Defend => match order.position {
                Some(position) => {
                    EvaluationResult::suggest(0.6, "Order: defend position", AiState::Arrive)
                        .with_position(position)
                }
                None => EvaluationResult::none(),
            },
            _ => EvaluationResult::none(),
        }
    }
}
