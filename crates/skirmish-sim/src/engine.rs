//! Simulation engine: the host loop around the agent core.
//!
//! `SimulationEngine` owns the hecs ECS world, processes battle commands,
//! runs all systems, and produces `BattleSnapshot`s. Completely headless,
//! enabling deterministic testing.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec3;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use skirmish_ai::config::AiTuning;
use skirmish_ai::AgentController;
use skirmish_core::commands::{AgentCommand, SquadOrder};
use skirmish_core::constants::{DEFAULT_SEED, TICK_RATE};
use skirmish_core::enums::{AiState, FormationPattern, OrderType};
use skirmish_core::events::AgentEvent;
use skirmish_core::state::BattleSnapshot;
use skirmish_core::types::{BodyId, ShipState, SimTime};

use crate::components::{Allegiance, Hull, Pilot, Ship};
use crate::error::{SimError, SimResult};
use crate::squad::SquadCoordinator;
use crate::systems;
use crate::world_setup::{self, ShipSetup};

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    pub tick_rate: u32,
    pub ai: AiTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            tick_rate: TICK_RATE,
            ai: AiTuning::default(),
        }
    }
}

impl SimConfig {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.ai.validate()?;
        Ok(config)
    }
}

/// Commands the host accepts between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BattleCommand {
    /// Forward a command to one agent.
    Agent { id: BodyId, command: AgentCommand },
    /// Set a squad's standing order.
    SquadOrder { squad: u32, order: SquadOrder },
    /// Damage a hull by a fraction of its integrity.
    ApplyHit { id: BodyId, damage: f32 },
    Destroy { id: BodyId },
}

/// The simulation engine. Owns the ECS world and all sim state.
pub struct SimulationEngine {
    world: World,
    time: SimTime,
    config: SimConfig,
    rng: ChaCha8Rng,
    next_body_id: u32,
    squads: SquadCoordinator,
    command_queue: VecDeque<BattleCommand>,
    despawn_buffer: Vec<Entity>,
    events: Vec<AgentEvent>,
}

impl SimulationEngine {
    /// Create a new simulation engine with the given config.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.ai.validate()?;
        Ok(Self {
            world: World::new(),
            time: SimTime::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            next_body_id: 1,
            squads: SquadCoordinator::new(&config.ai.formation),
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
            config,
        })
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: BattleCommand) {
        self.command_queue.push_back(command);
    }

    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = BattleCommand>) {
        self.command_queue.extend(commands);
    }

    /// Apply a command right away, reporting failures to the caller.
    pub fn command(&mut self, command: BattleCommand) -> SimResult<()> {
        self.handle_command(command)
    }

    /// Advance the simulation by one tick and return the resulting snapshot.
    pub fn tick(&mut self) -> BattleSnapshot {
        self.process_commands();
        self.run_systems();
        self.time.advance(f64::from(self.dt()));

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(&self.world, &self.time, events)
    }

    /// Seconds per tick.
    pub fn dt(&self) -> f32 {
        1.0 / self.config.tick_rate.max(1) as f32
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn squads(&self) -> &SquadCoordinator {
        &self.squads
    }

    /// Put a ship into the world with a fresh controller.
    pub fn spawn_ship(&mut self, setup: ShipSetup) -> BodyId {
        let id = BodyId(self.next_body_id);
        self.next_body_id += 1;
        let controller = AgentController::new(id, self.config.seed, self.config.ai.clone());
        world_setup::spawn_ship(&mut self.world, id, setup, controller);
        debug!(ship = %id, "ship spawned");
        id
    }

    pub fn spawn_obstacle(&mut self, center: Vec3, radius: f32) {
        world_setup::spawn_obstacle(&mut self.world, center, radius);
    }

    /// Scatter an asteroid field using the engine's seeded RNG.
    pub fn spawn_asteroid_field(&mut self, center: Vec3, spread: f32, count: usize) {
        world_setup::spawn_asteroid_field(&mut self.world, &mut self.rng, center, spread, count);
    }

    /// Group ships into a squad led by `leader`.
    pub fn add_squad(
        &mut self,
        leader: BodyId,
        wingmen: &[BodyId],
        pattern: FormationPattern,
    ) -> SimResult<u32> {
        for &id in std::iter::once(&leader).chain(wingmen) {
            self.entity(id)?;
        }
        let squad = self.squads.create(leader, wingmen, pattern);
        for &id in std::iter::once(&leader).chain(wingmen) {
            let entity = self.entity(id)?;
            if let Ok(mut allegiance) = self.world.get::<&mut Allegiance>(entity) {
                allegiance.squad = Some(squad);
            }
        }
        Ok(squad)
    }

    pub fn ship_state(&self, id: BodyId) -> Option<ShipState> {
        let entity = self.entity(id).ok()?;
        self.world.get::<&ShipState>(entity).ok().map(|s| *s)
    }

    pub fn agent_state(&self, id: BodyId) -> Option<AiState> {
        let entity = self.entity(id).ok()?;
        self.world.get::<&Pilot>(entity).ok().map(|p| p.0.state())
    }

    fn entity(&self, id: BodyId) -> SimResult<Entity> {
        self.world
            .query::<&Ship>()
            .iter()
            .find(|(_, ship)| ship.id == id)
            .map(|(entity, _)| entity)
            .ok_or(SimError::UnknownAgent(id))
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            if let Err(error) = self.handle_command(command) {
                warn!(%error, "command rejected");
            }
        }
    }

    fn handle_command(&mut self, command: BattleCommand) -> SimResult<()> {
        match command {
            BattleCommand::Agent { id, command } => self.send(id, command),
            BattleCommand::SquadOrder { squad, order } => {
                let poses = self.poses();
                let commands = self.squads.issue_order(squad, order, &poses)?;
                for (id, command) in commands {
                    self.send(id, command)?;
                }
                Ok(())
            }
            BattleCommand::ApplyHit { id, damage } => {
                let entity = self.entity(id)?;
                if let Ok(mut hull) = self.world.get::<&mut Hull>(entity) {
                    hull.health = (hull.health - damage.max(0.0)).max(0.0);
                    hull.last_hit_secs = Some(self.time.elapsed_secs);
                }
                Ok(())
            }
            BattleCommand::Destroy { id } => {
                let entity = self.entity(id)?;
                if let Ok(mut hull) = self.world.get::<&mut Hull>(entity) {
                    hull.health = 0.0;
                }
                Ok(())
            }
        }
    }

    fn send(&mut self, id: BodyId, command: AgentCommand) -> SimResult<()> {
        let entity = self.entity(id)?;
        let mut pilot = self
            .world
            .get::<&mut Pilot>(entity)
            .map_err(|_| SimError::UnknownAgent(id))?;
        pilot.0.command(command);
        Ok(())
    }

    fn poses(&self) -> BTreeMap<BodyId, (Vec3, f32)> {
        self.world
            .query::<(&Ship, &ShipState)>()
            .iter()
            .map(|(_, (ship, state))| (ship.id, (state.position, state.yaw)))
            .collect()
    }

    /// Run all systems in order.
    fn run_systems(&mut self) {
        let dt = self.dt();
        // 1. Agents read the start-of-tick world and write their controls
        systems::agents::run(
            &mut self.world,
            &self.squads,
            self.time.elapsed_secs,
            dt,
            &mut self.events,
        );
        // 2. Movement integration
        systems::movement::run(&mut self.world, dt);
        // 3. Cleanup destroyed hulls
        let destroyed = systems::cleanup::run(&mut self.world, &mut self.despawn_buffer);
        // 4. Squad bookkeeping for the dead
        for id in destroyed {
            if let Some(squad) = self.squads.remove_member(id) {
                self.reform(squad);
            }
        }
    }

    /// Re-issue a FormUp order after its squad's leader changed.
    fn reform(&mut self, squad: u32) {
        let Some(order) = self.squads.squad(squad).map(|s| s.order) else {
            return;
        };
        if order.kind != OrderType::FormUp {
            return;
        }
        if let Err(error) = self.handle_command(BattleCommand::SquadOrder { squad, order }) {
            warn!(%error, squad, "re-forming squad failed");
        }
    }
}
