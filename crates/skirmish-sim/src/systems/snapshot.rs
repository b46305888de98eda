//! Snapshot system: queries the ECS world and builds a `BattleSnapshot`.
//!
//! This system is read-only; it never modifies the world.

use hecs::World;

use skirmish_core::constants::SNAPSHOT_DECISIONS;
use skirmish_core::events::AgentEvent;
use skirmish_core::state::{AgentView, BattleSnapshot, ObstacleView};
use skirmish_core::types::{ShipState, SimTime};

use crate::components::{Allegiance, Controls, Hull, Obstacle, Pilot, Ship, Side};

/// Build the snapshot. Attitudes are given from the blue side's point of view.
pub fn build_snapshot(world: &World, time: &SimTime, events: Vec<AgentEvent>) -> BattleSnapshot {
    BattleSnapshot {
        time: *time,
        agents: build_agents(world),
        obstacles: build_obstacles(world),
        events,
    }
}

fn build_agents(world: &World) -> Vec<AgentView> {
    let mut agents: Vec<AgentView> = world
        .query::<(&Ship, &ShipState, &Hull, &Allegiance, &Pilot, &Controls)>()
        .iter()
        .map(|(_, (ship, state, hull, allegiance, pilot, controls))| {
            let controller = &pilot.0;
            let history = controller.decision_history();
            let skip = history.len().saturating_sub(SNAPSHOT_DECISIONS);
            AgentView {
                id: ship.id,
                squad: allegiance.squad,
                attitude: Side::Blue.attitude_toward(allegiance.side),
                position: state.position,
                yaw: state.yaw,
                speed: state.speed(),
                health: hull.health,
                state: controller.state(),
                phase: controller.phase(),
                tactic: controller.tactic(),
                target: controller.target(),
                arrived: controller.has_arrived(),
                controls: controls.output,
                debug: controller.debug_info(),
                recent_decisions: history.iter().skip(skip).map(|r| r.to_string()).collect(),
            }
        })
        .collect();
    agents.sort_by_key(|a| a.id);
    agents
}

fn build_obstacles(world: &World) -> Vec<ObstacleView> {
    world
        .query::<&Obstacle>()
        .iter()
        .map(|(_, o)| ObstacleView {
            center: o.center,
            radius: o.radius,
        })
        .collect()
}
