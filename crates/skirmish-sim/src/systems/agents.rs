//! Agent system: runs every agent controller against the start-of-tick world.

use hecs::World;

use skirmish_ai::world::Hardpoint;
use skirmish_ai::TickInput;
use skirmish_core::events::AgentEvent;
use skirmish_core::types::BodyId;

use crate::components::{Controls, Loadout, Pilot};
use crate::squad::SquadCoordinator;
use crate::world_view::{collect_obstacles, sample_ships, ShipSample, WorldView};

/// Tick every agent, storing its outputs in its `Controls`.
pub fn run(
    world: &mut World,
    squads: &SquadCoordinator,
    now_secs: f64,
    dt: f32,
    events: &mut Vec<AgentEvent>,
) {
    let ships = sample_ships(world);
    let obstacles = collect_obstacles(world);

    for sample in &ships {
        let Ok(mut pilot) = world.get::<&mut Pilot>(sample.entity) else {
            continue;
        };
        let hardpoints = world
            .get::<&Loadout>(sample.entity)
            .map(|loadout| hardpoints_in_range(&loadout, sample, pilot.0.target(), &ships))
            .unwrap_or_default();

        let input = TickInput {
            ship: Some(sample.state),
            spec: Some(sample.spec),
            health: sample.hull.health,
            last_hit_secs: sample.hull.last_hit_secs,
            order: squads.order_for(sample.squad, sample.id),
            hardpoints_in_range: hardpoints,
            now_secs,
            dt,
        };
        let view = WorldView::new(sample, &ships, &obstacles);
        let output = pilot.0.tick(&input, &view, events);
        drop(pilot);

        if let Ok(mut controls) = world.get::<&mut Controls>(sample.entity) {
            controls.output = output.controls;
            controls.fire = output.fire;
        }
    }
}

/// Mounts whose range covers the current target.
fn hardpoints_in_range(
    loadout: &Loadout,
    sample: &ShipSample,
    target: Option<BodyId>,
    ships: &[ShipSample],
) -> Vec<Hardpoint> {
    let Some(target) = target.and_then(|id| ships.iter().find(|s| s.id == id)) else {
        return Vec::new();
    };
    let range = sample.state.position.distance(target.state.position);
    loadout
        .mounts
        .iter()
        .filter(|m| range <= m.range)
        .map(|m| Hardpoint { kind: m.kind })
        .collect()
}
