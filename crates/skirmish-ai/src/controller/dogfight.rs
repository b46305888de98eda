//! Attack-run phase machine, breakaway, separation and evasion set-up.

use glam::Vec3;
use rand::Rng;
use tracing::{debug, info};

use skirmish_core::constants::{EVADE_WOBBLE_MAX, EVADE_WOBBLE_MIN, EVASION_PROJECTION};
use skirmish_core::enums::{AiState, Attitude, TacticalPhase, TacticalPosition};
use skirmish_core::events::AgentEvent;
use skirmish_core::types::{flatten, yaw_to_forward, ShipState};

use super::AgentController;
use crate::agent::Breakaway;
use crate::world::{BodyInfo, WorldQuery};

impl AgentController {
    /// Steering-target logic for AttackRun, CombatFly and Retreat.
    pub(super) fn update_dogfight(
        &mut self,
        ship: &ShipState,
        target: Option<&BodyInfo>,
        world: &dyn WorldQuery,
        dt: f32,
        events: &mut Vec<AgentEvent>,
    ) {
        if !self.agent.state.is_dogfight() {
            return;
        }
        let Some(target) = target else {
            return;
        };
        let t = self.tuning.dogfight.clone();
        let id = self.agent.id;

        self.agent.state_timer -= dt;
        let position = ship.position;
        let to_target = flatten(target.position - position);
        let range = to_target.length();
        let separation = self.separation(ship, world);

        if let Some(breakaway) = self.agent.breakaway.as_mut() {
            breakaway.remaining_secs -= dt;
        }
        match self.agent.breakaway {
            None if range < t.breakaway_min_range => {
                let direction = breakaway_direction(ship, to_target);
                self.agent.breakaway = Some(Breakaway {
                    direction,
                    remaining_secs: t.breakaway_duration,
                });
                info!(agent = %id, range, "break away");
                events.push(AgentEvent::BreakAwayStarted { agent: id, range });
            }
            Some(b) if b.remaining_secs <= 0.0 || range > t.breakaway_clear_range => {
                self.agent.breakaway = None;
                info!(agent = %id, range, "break away complete");
                events.push(AgentEvent::BreakAwayEnded { agent: id });
            }
            _ => {}
        }

        if let Some(breakaway) = self.agent.breakaway {
            self.agent.target_position =
                position + breakaway.direction * t.carrot_distance + separation;
            return;
        }

        match self.agent.state {
            AiState::Retreat => {
                let away = (-to_target).try_normalize().unwrap_or(ship.forward());
                self.agent.target_position = position + away * t.carrot_distance + separation;
                return;
            }
            AiState::CombatFly => {
                self.agent.target_position = self.tactical_point(ship, target) + separation;
                return;
            }
            _ => {}
        }

        match self.agent.phase {
            TacticalPhase::Approach => {
                let point = self.tactical_point(ship, target);
                self.agent.target_position = point;

                let facing = ship.forward().dot(to_target.normalize_or_zero());
                let arrived = flatten(point - position).length() < t.approach_arrive_range;
                let timed_out = self.agent.state_timer <= 0.0;
                let opportunity = facing > t.opportunity_dot && range < t.opportunity_range;
                if arrived || timed_out || opportunity {
                    self.set_phase(TacticalPhase::Attack, events);
                    self.agent.state_timer = t.attack_phase_secs;
                }
            }
            TacticalPhase::Attack => {
                let lead = range.min(t.intercept_max_lead_secs);
                let mut aim = target.position + flatten(target.velocity) * lead;
                if self.agent.tactic == TacticalPosition::Evade {
                    aim += self.evade_wobble(position, aim);
                }
                self.agent.target_position = aim + separation;

                if range < t.disengage_range || self.agent.state_timer <= 0.0 {
                    self.set_phase(TacticalPhase::Disengage, events);
                }
            }
            TacticalPhase::Disengage => {
                let away = (-to_target).try_normalize().unwrap_or(ship.forward());
                self.agent.target_position = position + away * t.carrot_distance + separation;

                if range > t.reengage_range {
                    self.pick_new_tactic();
                    self.set_phase(TacticalPhase::Approach, events);
                    self.agent.state_timer = t.approach_phase_secs;
                }
            }
        }
    }

    /// Side-to-side weave used while attacking defensively.
    fn evade_wobble(&self, position: Vec3, aim: Vec3) -> Vec3 {
        let to_aim = flatten(aim - position);
        let Some(dir) = to_aim.try_normalize() else {
            return Vec3::ZERO;
        };
        let right = dir.cross(Vec3::Y);
        let wave = (self.now_secs + f64::from(self.agent.id.0 % 100)).sin() as f32;
        let amplitude = (to_aim.length() * 0.25).clamp(EVADE_WOBBLE_MIN, EVADE_WOBBLE_MAX);
        right * wave * amplitude
    }

    /// Where the attack run sets up relative to the target.
    pub(super) fn tactical_point(&self, ship: &ShipState, target: &BodyInfo) -> Vec3 {
        let distance = self.agent.attack_distance;
        let forward = yaw_to_forward(target.yaw);
        let right = forward.cross(Vec3::Y);
        match self.agent.tactic {
            TacticalPosition::Direct => target.position + forward * distance,
            TacticalPosition::Behind => target.position - forward * distance,
            TacticalPosition::FlankLeft => target.position - right * distance,
            TacticalPosition::FlankRight => target.position + right * distance,
            TacticalPosition::Evade => {
                let to_me = flatten(ship.position - target.position)
                    .try_normalize()
                    .unwrap_or(-forward);
                let tangent = to_me.cross(Vec3::Y);
                target.position + (to_me + tangent).normalize_or_zero() * distance
            }
        }
    }

    /// Boids-style push away from nearby friendly and neutral ships.
    pub(super) fn separation(&self, ship: &ShipState, world: &dyn WorldQuery) -> Vec3 {
        let t = &self.tuning.dogfight;
        let radius_sq = t.separation_radius * t.separation_radius;
        world
            .neighbors()
            .iter()
            .filter(|n| n.id != self.agent.id)
            .filter(|n| matches!(n.attitude, Attitude::Friend | Attitude::Neutral))
            .filter_map(|n| {
                let offset = flatten(ship.position - n.position);
                let dist_sq = offset.length_squared();
                (dist_sq < radius_sq && dist_sq > 0.1)
                    .then(|| offset.normalize() / dist_sq.sqrt() * t.separation_weight)
            })
            .sum()
    }

    pub(super) fn pick_new_tactic(&mut self) {
        let options = TacticalPosition::ATTACK_POSITIONS;
        self.agent.tactic = options[self.rng.gen_range(0..options.len())];
        debug!(agent = %self.agent.id, tactic = ?self.agent.tactic, "new tactic");
    }

    pub(super) fn set_phase(&mut self, phase: TacticalPhase, events: &mut Vec<AgentEvent>) {
        let from = self.agent.phase;
        if from == phase {
            return;
        }
        self.agent.phase = phase;
        debug!(agent = %self.agent.id, ?from, to = ?phase, "phase change");
        events.push(AgentEvent::PhaseChanged {
            agent: self.agent.id,
            from,
            to: phase,
        });
    }

    /// Commit to an escape heading for a few seconds.
    ///
    /// With speed, the heading keeps most of the current momentum by
    /// flanking the threat on the side we are already moving toward.
    /// Stationary agents pick a side at random.
    pub(super) fn enter_evasion(
        &mut self,
        ship: &ShipState,
        threat: Option<Vec3>,
        events: &mut Vec<AgentEvent>,
    ) {
        let t = &self.tuning.dogfight;
        let (min_secs, max_secs) = (t.evasion_min_secs, t.evasion_max_secs);

        let threat_dir = match threat.and_then(|p| flatten(ship.position - p).try_normalize()) {
            Some(dir) => dir,
            None => yaw_to_forward(self.rng.gen_range(0.0..std::f32::consts::TAU)),
        };
        let side = threat_dir.cross(Vec3::Y);

        let velocity = flatten(ship.velocity);
        let direction = if velocity.length() > 5.0 {
            let side = if side.dot(velocity) < 0.0 { -side } else { side };
            (threat_dir * 0.4 + side * 0.6).normalize_or_zero()
        } else {
            let side = if self.rng.gen_bool(0.5) { -side } else { side };
            (threat_dir * 0.3 + side * 0.7).normalize_or_zero()
        };
        let direction = if direction == Vec3::ZERO {
            ship.forward()
        } else {
            direction
        };

        let duration = self.rng.gen_range(min_secs..=max_secs);
        let agent = &mut self.agent;
        agent.state = AiState::Evasion;
        agent.state_timer = duration;
        agent.evasion_direction = direction;
        agent.target_position = ship.position + direction * EVASION_PROJECTION;
        agent.breakaway = None;

        info!(agent = %agent.id, duration, ?direction, "entering evasion");
        events.push(AgentEvent::EvasionStarted {
            agent: agent.id,
            direction,
            duration_secs: duration,
        });
    }
}

/// Lateral escape away from the side the target is on, with some forward
/// component so the ship keeps its speed.
fn breakaway_direction(ship: &ShipState, to_target: Vec3) -> Vec3 {
    let forward = ship.forward();
    let right = ship.right();
    let side = right.dot(to_target.normalize_or_zero());
    let lateral = if side > 0.0 { -right } else { right };
    (lateral + forward * 0.5).normalize_or_zero()
}
