//! Per-agent orchestrator.
//!
//! Each tick: apply queued commands, take in the squad order, refresh the
//! target, let the decision engine think, run the dogfight phase machine,
//! work out weapon eligibility, build the pilot command for the current
//! state and run the pilot.

mod dogfight;
mod maneuvers;

use std::collections::VecDeque;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use skirmish_core::commands::{AgentCommand, SquadOrder};
use skirmish_core::enums::{AiState, HardpointKind, OrderType, TacticalPhase, TacticalPosition};
use skirmish_core::events::AgentEvent;
use skirmish_core::types::{flatten, BodyId, ControlOutput, ShipSpec, ShipState};

use crate::agent::{Agent, FormationAssignment};
use crate::config::AiTuning;
use crate::decision::{DecisionEngine, DecisionLog, Situation};
use crate::error::{ControlError, ControlResult};
use crate::formation::FormationSolver;
use crate::navigation::NavigationField;
use crate::pilot::{PilotController, PilotSensors};
use crate::trail::PursuitTrail;
use crate::world::{BodyInfo, Hardpoint, WorldQuery};

/// Everything the host hands an agent for one tick.
#[derive(Debug, Clone)]
pub struct TickInput {
    pub ship: Option<ShipState>,
    pub spec: Option<ShipSpec>,
    /// Hull fraction in [0, 1].
    pub health: f32,
    pub last_hit_secs: Option<f64>,
    pub order: SquadOrder,
    /// Hardpoints the weapon system reports in range of the target.
    pub hardpoints_in_range: Vec<Hardpoint>,
    pub now_secs: f64,
    pub dt: f32,
}

impl TickInput {
    pub fn new(ship: ShipState, spec: ShipSpec, now_secs: f64, dt: f32) -> Self {
        Self {
            ship: Some(ship),
            spec: Some(spec),
            health: 1.0,
            last_hit_secs: None,
            order: SquadOrder::default(),
            hardpoints_in_range: Vec::new(),
            now_secs,
            dt,
        }
    }
}

/// Which weapon groups may fire this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireIntent {
    pub target: Option<BodyId>,
    pub fire_fixed: bool,
    pub fire_turrets: bool,
    pub fire_missiles: bool,
}

impl FireIntent {
    pub fn any(&self) -> bool {
        self.fire_fixed || self.fire_turrets || self.fire_missiles
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgentOutput {
    pub controls: ControlOutput,
    pub fire: FireIntent,
}

#[derive(Debug)]
pub struct AgentController {
    agent: Agent,
    tuning: AiTuning,
    pilot: PilotController,
    navigation: NavigationField,
    formation: FormationSolver,
    brain: DecisionEngine,
    trail: PursuitTrail,
    rng: ChaCha8Rng,
    pending: VecDeque<AgentCommand>,
    steering_timer: f64,
    cached_direction: Vec3,
    order: SquadOrder,
    now_secs: f64,
    missing_state_warned: bool,
}

impl AgentController {
    /// `seed` is the run seed; it is mixed with the id so every agent draws
    /// from its own stream.
    pub fn new(id: BodyId, seed: u64, tuning: AiTuning) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(
            seed ^ u64::from(id.0).wrapping_mul(0x9e37_79b9_7f4a_7c15),
        );
        let interval = tuning.navigation.steering_interval;
        // Spread ray-cast work across frames.
        let steering_timer = if interval > 0.0 {
            rng.gen_range(0.0..interval)
        } else {
            0.0
        };
        Self {
            agent: Agent::new(id),
            pilot: PilotController::new(tuning.pilot.clone()),
            navigation: NavigationField::new(tuning.navigation.clone()),
            formation: FormationSolver::new(&tuning.formation),
            brain: DecisionEngine::new(tuning.decision.clone()),
            trail: PursuitTrail::default(),
            rng,
            pending: VecDeque::new(),
            steering_timer,
            cached_direction: Vec3::NEG_Z,
            order: SquadOrder::default(),
            now_secs: 0.0,
            missing_state_warned: false,
            tuning,
        }
    }

    /// Replace the decision engine, e.g. with a custom consideration set.
    pub fn with_decision_engine(mut self, brain: DecisionEngine) -> Self {
        self.brain = brain;
        self
    }

    pub fn id(&self) -> BodyId {
        self.agent.id
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn state(&self) -> AiState {
        self.agent.state
    }

    pub fn phase(&self) -> TacticalPhase {
        self.agent.phase
    }

    pub fn tactic(&self) -> TacticalPosition {
        self.agent.tactic
    }

    pub fn target(&self) -> Option<BodyId> {
        self.agent.target
    }

    pub fn formation_assignment(&self) -> Option<FormationAssignment> {
        self.agent.formation
    }

    pub fn has_arrived(&self) -> bool {
        self.pilot.has_arrived()
    }

    pub fn orientation_matched(&self) -> bool {
        self.pilot.orientation_matched()
    }

    pub fn decision_history(&self) -> &DecisionLog {
        self.brain.history()
    }

    pub fn current_thought(&self) -> &str {
        self.brain.current_thought()
    }

    pub fn pilot(&self) -> &PilotController {
        &self.pilot
    }

    pub fn navigation(&self) -> &NavigationField {
        &self.navigation
    }

    pub fn trail(&self) -> &PursuitTrail {
        &self.trail
    }

    /// Pilot line plus what the brain is thinking.
    pub fn debug_info(&self) -> String {
        format!("{}\n{}", self.pilot.debug_string(), self.brain.current_thought())
    }

    /// Queue a command; it takes effect at the start of the next tick.
    pub fn command(&mut self, command: AgentCommand) {
        self.pending.push_back(command);
    }

    /// Run one tick. Never fails: a tick without ship state or spec is
    /// skipped with neutral outputs and a single warning per outage.
    pub fn tick(
        &mut self,
        input: &TickInput,
        world: &dyn WorldQuery,
        events: &mut Vec<AgentEvent>,
    ) -> AgentOutput {
        match self.try_tick(input, world, events) {
            Ok(output) => {
                self.missing_state_warned = false;
                output
            }
            Err(err) => {
                if !self.missing_state_warned {
                    warn!(agent = %self.agent.id, %err, "skipping agent tick");
                    self.missing_state_warned = true;
                }
                AgentOutput {
                    controls: self.pilot.neutral(),
                    fire: FireIntent::default(),
                }
            }
        }
    }

    fn try_tick(
        &mut self,
        input: &TickInput,
        world: &dyn WorldQuery,
        events: &mut Vec<AgentEvent>,
    ) -> ControlResult<AgentOutput> {
        let id = self.agent.id;
        let ship = input.ship.ok_or(ControlError::MissingShipState(id))?;
        let spec = input.spec.ok_or(ControlError::MissingShipSpec(id))?;
        let dt = input.dt;
        self.now_secs = input.now_secs;
        self.steering_timer -= f64::from(dt);

        while let Some(command) = self.pending.pop_front() {
            self.apply_command(command, &ship, world, events);
        }
        self.take_order(input.order, &ship, world, events);

        let target = self.refresh_target(world, events);

        let situation = Situation {
            now_secs: input.now_secs,
            health: input.health,
            last_hit_secs: input.last_hit_secs,
            target_distance: target
                .as_ref()
                .map(|t| flatten(t.position - ship.position).length()),
            order: input.order,
        };
        let previous = self.agent.state;
        if let Some(decision) = self
            .brain
            .tick(&mut self.agent, &situation, dt, &mut self.rng)
        {
            events.push(AgentEvent::DecisionMade {
                agent: id,
                state: decision.suggested_state,
                reason: decision.reason,
                score: decision.score,
            });
            self.on_state_entered(previous, &ship, target.as_ref(), events);
        }

        self.update_dogfight(&ship, target.as_ref(), world, dt, events);

        let fire = self.weapon_intent(&ship, target.as_ref(), &input.hardpoints_in_range);

        let command = self.pilot_command(&ship, &spec, target.as_ref(), world, dt, events);
        let controls = self.pilot.update(
            &ship,
            &spec,
            &command,
            PilotSensors {
                self_id: id,
                world,
                navigation: Some(&mut self.navigation),
            },
        );

        Ok(AgentOutput { controls, fire })
    }

    fn apply_command(
        &mut self,
        command: AgentCommand,
        ship: &ShipState,
        world: &dyn WorldQuery,
        events: &mut Vec<AgentEvent>,
    ) {
        let agent = &mut self.agent;
        match command {
            AgentCommand::FlyTo { position } => {
                agent.target = None;
                agent.target_position = position;
                agent.target_orientation = None;
                agent.state = AiState::Arrive;
                self.pilot.reset();
                self.trail.clear();
            }
            AgentCommand::FlyToAndFace { position, yaw } => {
                agent.target = None;
                agent.target_position = position;
                agent.target_orientation = Some(yaw);
                agent.state = AiState::ArriveOrient;
                self.pilot.reset();
                self.trail.clear();
            }
            AgentCommand::FollowTarget { target } => {
                if agent.target != Some(target) {
                    self.trail.clear();
                }
                agent.target = Some(target);
                agent.state = AiState::Follow;
            }
            AgentCommand::JoinFormation {
                leader,
                slot,
                pattern,
            } => {
                agent.formation = Some(FormationAssignment {
                    leader,
                    slot,
                    pattern,
                });
                agent.state = AiState::Formation;
            }
            AgentCommand::AttackFrom {
                target,
                tactic,
                distance,
            } => {
                if agent.target != Some(target) {
                    self.trail.clear();
                }
                agent.target = Some(target);
                agent.tactic = tactic;
                agent.attack_distance = distance;
                agent.state = AiState::AttackRun;
                agent.phase = TacticalPhase::Approach;
                agent.state_timer = self.tuning.dogfight.approach_phase_secs;
                agent.breakaway = None;
            }
            AgentCommand::ForceState { state } => {
                agent.state = state;
                agent.state_timer = 0.0;
                agent.breakaway = None;
                self.brain.reset_commitment();
                if state == AiState::Evasion {
                    let threat = self.agent.target.and_then(|t| world.body(t));
                    self.enter_evasion(ship, threat.map(|t| t.position), events);
                }
            }
            AgentCommand::EnterEvasion { threat } => {
                if agent.state == AiState::Evasion && agent.state_timer > 0.0 {
                    return;
                }
                let threat = threat.and_then(|t| world.body(t));
                self.enter_evasion(ship, threat.map(|t| t.position), events);
            }
            AgentCommand::WarpTo { position } => {
                agent.warp_target = position;
                agent.state = AiState::Warp;
                self.pilot.reset();
            }
        }
    }

    /// A changed squad order takes effect at once and drops any
    /// commitment the brain held to the previous one.
    fn take_order(
        &mut self,
        order: SquadOrder,
        ship: &ShipState,
        world: &dyn WorldQuery,
        events: &mut Vec<AgentEvent>,
    ) {
        if order == self.order {
            return;
        }
        self.order = order;
        self.brain.reset_commitment();
        info!(agent = %self.agent.id, order = ?order.kind, "squad order received");

        if let Some(target) = order.target {
            if self.agent.target != Some(target) {
                self.trail.clear();
            }
            self.agent.target = Some(target);
        }
        let agent = &mut self.agent;
        match order.kind {
            OrderType::AttackTarget | OrderType::FreeFire if agent.target.is_some() => {
                let state = if order.kind == OrderType::AttackTarget {
                    AiState::AttackRun
                } else {
                    AiState::CombatFly
                };
                if !agent.state.is_dogfight() {
                    agent.phase = TacticalPhase::Approach;
                    agent.state_timer = self.tuning.dogfight.approach_phase_secs;
                    agent.breakaway = None;
                }
                agent.state = state;
            }
            OrderType::Evasion => {
                let threat = agent.target.and_then(|t| world.body(t));
                self.enter_evasion(ship, threat.map(|t| t.position), events);
            }
            OrderType::HoldFire => {
                agent.state = AiState::Idle;
                agent.breakaway = None;
            }
            OrderType::FormUp => {
                agent.state = AiState::Formation;
                agent.state_timer = 0.0;
                agent.breakaway = None;
            }
            OrderType::Defend => {
                if let Some(position) = order.position {
                    agent.target_position = position;
                    agent.state = AiState::Arrive;
                    self.pilot.reset();
                }
            }
            _ => {}
        }
    }

    /// Resolve the target handle, dropping it if the body is gone.
    fn refresh_target(
        &mut self,
        world: &dyn WorldQuery,
        events: &mut Vec<AgentEvent>,
    ) -> Option<BodyInfo> {
        let id = self.agent.target?;
        match world.body(id) {
            Some(info) => {
                if matches!(self.agent.state, AiState::Seek | AiState::Follow) {
                    self.agent.target_position = info.position;
                }
                Some(info)
            }
            None => {
                info!(agent = %self.agent.id, target = %id, "target lost");
                events.push(AgentEvent::TargetLost {
                    agent: self.agent.id,
                    target: id,
                });
                self.agent.target = None;
                self.trail.clear();
                if self.agent.state.needs_target() {
                    self.agent.state = self.agent.fallback_state();
                    self.agent.phase = TacticalPhase::Approach;
                    self.agent.state_timer = 0.0;
                    self.agent.breakaway = None;
                    self.brain.reset_commitment();
                }
                None
            }
        }
    }

    /// Set-up for a state the decision engine just switched to.
    fn on_state_entered(
        &mut self,
        previous: AiState,
        ship: &ShipState,
        target: Option<&BodyInfo>,
        events: &mut Vec<AgentEvent>,
    ) {
        match self.agent.state {
            AiState::Evasion => {
                self.enter_evasion(ship, target.map(|t| t.position), events);
            }
            AiState::AttackRun | AiState::CombatFly if !previous.is_dogfight() => {
                self.agent.phase = TacticalPhase::Approach;
                self.agent.state_timer = self.tuning.dogfight.approach_phase_secs;
                self.agent.breakaway = None;
            }
            AiState::Arrive => self.pilot.reset(),
            _ => {}
        }
    }

    fn weapon_intent(
        &self,
        ship: &ShipState,
        target: Option<&BodyInfo>,
        hardpoints: &[Hardpoint],
    ) -> FireIntent {
        let Some(target) = target else {
            return FireIntent::default();
        };
        let mut intent = FireIntent {
            target: Some(target.id),
            ..Default::default()
        };
        if self.order.kind == OrderType::HoldFire {
            return intent;
        }

        let to_target = flatten(target.position - ship.position).normalize_or_zero();
        let aligned = ship.forward().dot(to_target) > self.tuning.dogfight.fire_alignment_dot;
        for hardpoint in hardpoints {
            match hardpoint.kind {
                HardpointKind::Turret => intent.fire_turrets = true,
                HardpointKind::Missile => intent.fire_missiles = true,
                HardpointKind::Fixed => {
                    if aligned && !self.agent.is_breaking_away() {
                        intent.fire_fixed = true;
                    }
                }
            }
        }
        intent
    }
}
