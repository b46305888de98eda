//! Runtime tuning for the agent control core.
//!
//! Every struct defaults to the values in `skirmish_core::constants` and
//! deserializes with `#[serde(default)]`, so a config file only needs the
//! fields it overrides.

use serde::{Deserialize, Serialize};

use skirmish_core::constants::*;

use crate::error::ConfigError;

/// All tuning for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    pub navigation: NavigationConfig,
    pub pilot: PilotTuning,
    pub decision: DecisionTuning,
    pub dogfight: DogfightTuning,
    pub formation: FormationConfig,
}

impl AiTuning {
    /// Reject values that would make a tick panic or produce NaN steering.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let decision = &self.decision;
        ordered("decision.reaction", decision.reaction_min, decision.reaction_max)?;
        ordered("decision.commit", decision.commit_min, decision.commit_max)?;
        let dogfight = &self.dogfight;
        ordered(
            "dogfight.evasion_secs",
            dogfight.evasion_min_secs,
            dogfight.evasion_max_secs,
        )?;
        positive("navigation.base_lookahead", self.navigation.base_lookahead)?;
        positive("navigation.max_lookahead", self.navigation.max_lookahead)?;
        Ok(())
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    // Written negated so NaN fails too.
    if !(min <= max) {
        return Err(ConfigError::InvertedRange { field, min, max });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value > 0.0) {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

/// Context-steering ray fan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Number of rays; rounded up to a power of two.
    pub ray_count: usize,
    pub base_lookahead: f32,
    pub speed_lookahead_factor: f32,
    pub max_lookahead: f32,
    pub danger_penalty: f32,
    pub danger_smear: usize,
    /// Seconds between cached queries.
    pub steering_interval: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            ray_count: NAV_RAY_COUNT,
            base_lookahead: NAV_BASE_LOOKAHEAD,
            speed_lookahead_factor: NAV_SPEED_LOOKAHEAD_FACTOR,
            max_lookahead: NAV_MAX_LOOKAHEAD,
            danger_penalty: NAV_DANGER_PENALTY,
            danger_smear: NAV_DANGER_SMEAR,
            steering_interval: NAV_STEERING_INTERVAL,
        }
    }
}

/// Arrival, PD and avoidance gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotTuning {
    pub rotation_kp: f32,
    pub rotation_kd: f32,
    pub capital_agility: f32,
    pub braking_safety: f32,
    pub arrival_speed: f32,
    pub arrival_hysteresis: f32,
    pub turn_gate_deg: f32,
    pub throttle_gain_speed: f32,
    pub full_brake_speed: f32,
    pub boost_speed_error: f32,
    pub feed_forward_limit: f32,
    pub orientation_tolerance_deg: f32,
    pub avoid_lookahead_secs: f32,
    pub avoid_danger_radius: f32,
    pub avoid_radius: f32,
    pub avoid_min_closing_speed: f32,
}

impl Default for PilotTuning {
    fn default() -> Self {
        Self {
            rotation_kp: PILOT_ROTATION_KP,
            rotation_kd: PILOT_ROTATION_KD,
            capital_agility: PILOT_CAPITAL_AGILITY,
            braking_safety: PILOT_BRAKING_SAFETY,
            arrival_speed: PILOT_ARRIVAL_SPEED,
            arrival_hysteresis: PILOT_ARRIVAL_HYSTERESIS,
            turn_gate_deg: PILOT_TURN_GATE_DEG,
            throttle_gain_speed: PILOT_THROTTLE_GAIN_SPEED,
            full_brake_speed: PILOT_FULL_BRAKE_SPEED,
            boost_speed_error: PILOT_BOOST_SPEED_ERROR,
            feed_forward_limit: PILOT_FEED_FORWARD_LIMIT,
            orientation_tolerance_deg: PILOT_ORIENTATION_TOLERANCE_DEG,
            avoid_lookahead_secs: AVOID_LOOKAHEAD_SECS,
            avoid_danger_radius: AVOID_DANGER_RADIUS,
            avoid_radius: AVOID_RADIUS,
            avoid_min_closing_speed: AVOID_MIN_CLOSING_SPEED,
        }
    }
}

/// Reaction time and commitment rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTuning {
    pub reaction_min: f32,
    pub reaction_max: f32,
    pub commit_min: f32,
    pub commit_max: f32,
    pub critical_score: f32,
    pub override_margin: f32,
    pub log_capacity: usize,
}

impl Default for DecisionTuning {
    fn default() -> Self {
        Self {
            reaction_min: DECISION_REACTION_MIN,
            reaction_max: DECISION_REACTION_MAX,
            commit_min: DECISION_COMMIT_MIN,
            commit_max: DECISION_COMMIT_MAX,
            critical_score: DECISION_CRITICAL_SCORE,
            override_margin: DECISION_OVERRIDE_MARGIN,
            log_capacity: DECISION_LOG_CAPACITY,
        }
    }
}

/// Attack-run geometry and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DogfightTuning {
    pub breakaway_min_range: f32,
    pub breakaway_clear_range: f32,
    pub breakaway_duration: f32,
    pub approach_arrive_range: f32,
    pub attack_phase_secs: f32,
    pub approach_phase_secs: f32,
    pub opportunity_dot: f32,
    pub opportunity_range: f32,
    pub disengage_range: f32,
    pub reengage_range: f32,
    pub intercept_max_lead_secs: f32,
    pub separation_radius: f32,
    pub separation_weight: f32,
    pub carrot_distance: f32,
    pub direct_range: f32,
    pub evasion_min_secs: f32,
    pub evasion_max_secs: f32,
    pub fire_alignment_dot: f32,
}

impl Default for DogfightTuning {
    fn default() -> Self {
        Self {
            breakaway_min_range: BREAKAWAY_MIN_RANGE,
            breakaway_clear_range: BREAKAWAY_CLEAR_RANGE,
            breakaway_duration: BREAKAWAY_DURATION,
            approach_arrive_range: APPROACH_ARRIVE_RANGE,
            attack_phase_secs: ATTACK_PHASE_SECS,
            approach_phase_secs: APPROACH_PHASE_SECS,
            opportunity_dot: OPPORTUNITY_DOT,
            opportunity_range: OPPORTUNITY_RANGE,
            disengage_range: DISENGAGE_RANGE,
            reengage_range: REENGAGE_RANGE,
            intercept_max_lead_secs: INTERCEPT_MAX_LEAD_SECS,
            separation_radius: SEPARATION_RADIUS,
            separation_weight: SEPARATION_WEIGHT,
            carrot_distance: ATTACK_CARROT_DISTANCE,
            direct_range: ATTACK_DIRECT_RANGE,
            evasion_min_secs: EVASION_MIN_SECS,
            evasion_max_secs: EVASION_MAX_SECS,
            fire_alignment_dot: FIRE_ALIGNMENT_DOT,
        }
    }
}

/// Slot geometry and formation-keeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    pub spacing: f32,
    pub depth: f32,
    pub lead_secs: f32,
    pub catch_up_range: f32,
    /// Route formation flight through the navigation field.
    pub use_navigation: bool,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            spacing: FORMATION_SPACING,
            depth: FORMATION_DEPTH,
            lead_secs: FORMATION_LEAD_SECS,
            catch_up_range: FORMATION_CATCH_UP_RANGE,
            use_navigation: true,
        }
    }
}
