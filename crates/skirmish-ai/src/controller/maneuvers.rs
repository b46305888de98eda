//! Per-state pilot commands and the throttled steering wrapper.

use glam::Vec3;
use tracing::info;

use skirmish_core::constants::{
    DEFAULT_SLOWDOWN_RADIUS, EVASION_PROJECTION, FOLLOW_DISTANCE, FOLLOW_IDLE_SPEED_FRACTION,
};
use skirmish_core::enums::{AiState, TacticalPhase};
use skirmish_core::events::AgentEvent;
use skirmish_core::types::{flatten, BodyId, ShipSpec, ShipState};

use super::AgentController;
use crate::pilot::PilotCommand;
use crate::world::{BodyInfo, WorldQuery};

impl AgentController {
    pub(super) fn pilot_command(
        &mut self,
        ship: &ShipState,
        spec: &ShipSpec,
        target: Option<&BodyInfo>,
        world: &dyn WorldQuery,
        dt: f32,
        events: &mut Vec<AgentEvent>,
    ) -> PilotCommand {
        let position = ship.position;
        let max_speed = spec.max_speed;
        let t = self.tuning.dogfight.clone();

        match self.agent.state {
            AiState::Idle => hold(ship),

            AiState::Seek => match target {
                Some(target) => {
                    let goal = self.agent.target_position;
                    let direction =
                        self.steering_direction(ship, goal, Some(target), &[target.id], world);
                    let aim = if flatten(goal - position).length() < t.direct_range {
                        goal
                    } else {
                        position + direction * t.carrot_distance
                    };
                    PilotCommand::to(aim)
                        .speed(max_speed)
                        .radii(5.0, 0.0)
                        .ignoring(target.id)
                }
                None => PilotCommand::to(self.agent.target_position)
                    .speed(max_speed)
                    .navigated(true),
            },

            AiState::Arrive => PilotCommand::to(self.agent.target_position)
                .speed(max_speed)
                .navigated(true),

            AiState::ArriveOrient => PilotCommand::to(self.agent.target_position)
                .speed(max_speed)
                .facing(self.agent.target_orientation.unwrap_or(ship.yaw)),

            AiState::Follow => match target {
                Some(target) => {
                    let behind = target.position - target.forward() * FOLLOW_DISTANCE;
                    let target_speed = flatten(target.velocity).length();
                    let speed = if target_speed > 1.0 {
                        target_speed
                    } else {
                        max_speed * FOLLOW_IDLE_SPEED_FRACTION
                    };
                    PilotCommand::to(behind)
                        .speed(speed)
                        .radii(3.0, 15.0)
                        .facing(target.yaw)
                        .ignoring(target.id)
                }
                None => hold(ship),
            },

            AiState::Formation => self.formation_command(ship, spec, world),

            AiState::AttackRun => {
                let goal = self.agent.target_position;
                let ignore: Vec<BodyId> = target.map(|b| b.id).into_iter().collect();
                let direction = self.steering_direction(ship, goal, target, &ignore, world);
                let aim = if flatten(goal - position).length() < t.direct_range {
                    goal
                } else {
                    position + direction * t.carrot_distance
                };
                let mut command = PilotCommand::to(aim).speed(max_speed).radii(5.0, 0.0);
                command.ignore = ignore;
                command
            }

            AiState::CombatFly => {
                let mut command = PilotCommand::to(self.agent.target_position)
                    .speed(max_speed)
                    .radii(5.0, 0.0);
                if let Some(target) = target {
                    command = command.ignoring(target.id);
                }
                command
            }

            AiState::Evasion => {
                self.agent.target_position =
                    position + self.agent.evasion_direction * EVASION_PROJECTION;
                let command = PilotCommand::to(self.agent.target_position)
                    .speed(max_speed)
                    .radii(100.0, 0.0);

                self.agent.state_timer -= dt;
                if self.agent.state_timer <= 0.0 {
                    self.leave_evasion(target.is_some(), events);
                    self.agent.state_timer = t.approach_phase_secs;
                }
                command
            }

            AiState::Retreat => {
                let aim = if target.is_some() {
                    self.agent.target_position
                } else {
                    position + ship.forward() * t.carrot_distance
                };
                PilotCommand::to(aim).speed(max_speed).radii(5.0, 0.0)
            }

            AiState::Warp => {
                let mut command = PilotCommand::to(self.agent.warp_target)
                    .speed(spec.warp_speed)
                    .boost(true);
                command.warp = true;
                command
            }
        }
    }

    fn leave_evasion(&mut self, has_target: bool, events: &mut Vec<AgentEvent>) {
        let id = self.agent.id;
        self.pick_new_tactic();
        self.agent.phase = TacticalPhase::Approach;
        self.agent.state = if has_target {
            AiState::AttackRun
        } else {
            self.agent.fallback_state()
        };
        info!(agent = %id, state = ?self.agent.state, "evasion over");
        events.push(AgentEvent::EvasionEnded { agent: id });
    }

    /// Station-keeping on the leader: aim at where the slot will be a
    /// moment from now and feed the leader's velocity forward.
    fn formation_command(
        &mut self,
        ship: &ShipState,
        spec: &ShipSpec,
        world: &dyn WorldQuery,
    ) -> PilotCommand {
        let Some(assignment) = self.agent.formation else {
            return hold(ship);
        };
        let Some(leader) = world.body(assignment.leader) else {
            return hold(ship);
        };
        let cfg = self.tuning.formation.clone();

        let leader_velocity = flatten(leader.velocity);
        let predicted = leader.position + leader_velocity * cfg.lead_secs;
        let slot = self.formation.world_position(
            assignment.slot,
            assignment.pattern,
            predicted,
            leader.yaw,
        );
        let facing = self.formation.orientation(assignment.slot, leader.yaw);

        let ignore = [leader.id];
        let distance = flatten(slot - ship.position).length();
        let aim = if cfg.use_navigation && distance > self.tuning.dogfight.direct_range {
            // Carrot scaled by the real distance keeps the arrival braking right.
            let direction = self.steering_direction(ship, slot, None, &ignore, world);
            ship.position + direction * distance
        } else {
            slot
        };

        let catching_up = leader_velocity.length() > spec.max_speed + 5.0
            || flatten(aim - ship.position).length() > cfg.catch_up_range;

        PilotCommand::to(aim)
            .speed(spec.max_speed)
            .radii(2.0, DEFAULT_SLOWDOWN_RADIUS)
            .facing(facing)
            .matching(leader_velocity)
            .boost(catching_up)
            .ignoring(leader.id)
    }

    /// Navigation-field direction toward `goal`, recomputed at most once
    /// per steering interval.
    ///
    /// While pursuing, a goal hidden behind an obstacle is replaced by the
    /// target itself or the freshest visible point on its trail.
    fn steering_direction(
        &mut self,
        ship: &ShipState,
        goal: Vec3,
        target: Option<&BodyInfo>,
        ignore: &[BodyId],
        world: &dyn WorldQuery,
    ) -> Vec3 {
        if self.steering_timer > 0.0 {
            return self.cached_direction;
        }

        let mut goal = goal;
        if matches!(self.agent.state, AiState::AttackRun | AiState::Seek) {
            if let Some(target) = target {
                self.trail.update(target.position, self.now_secs);
                let exclude = [self.agent.id, target.id];
                if !world.line_of_sight(ship.position, goal, &exclude) {
                    goal = self
                        .trail
                        .pursuit_point(ship.position, target.position, &exclude, world);
                }
            }
        }

        self.cached_direction = self.navigation.best_direction(
            ship,
            goal,
            self.agent.id,
            ignore,
            ship.speed(),
            world,
        );
        self.steering_timer = self.tuning.navigation.steering_interval;
        self.cached_direction
    }
}

/// Stop where we are and keep the current heading.
fn hold(ship: &ShipState) -> PilotCommand {
    PilotCommand::to(ship.position)
        .speed(0.0)
        .radii(1.0, DEFAULT_SLOWDOWN_RADIUS)
        .facing(ship.yaw)
}
