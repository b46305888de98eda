//! The host's implementation of the agent core's world queries.
//!
//! Ship state is sampled once at the start of the agent pass, so every agent
//! sees the same start-of-tick world no matter the update order.

use glam::Vec3;
use hecs::{Entity, World};

use skirmish_ai::world::{intersect_sphere, BodyInfo, RayHit, WorldQuery};
use skirmish_core::types::{BodyId, ShipSpec, ShipState};

use crate::components::{hull_radius, Allegiance, Hull, Obstacle, Ship, Side};

/// Start-of-tick copy of one ship.
#[derive(Debug, Clone, Copy)]
pub struct ShipSample {
    pub entity: Entity,
    pub id: BodyId,
    pub side: Side,
    pub squad: Option<u32>,
    pub state: ShipState,
    pub spec: ShipSpec,
    pub hull: Hull,
    pub radius: f32,
}

/// Sample every ship, ordered by id.
pub fn sample_ships(world: &World) -> Vec<ShipSample> {
    let mut samples: Vec<ShipSample> = world
        .query::<(&Ship, &ShipState, &ShipSpec, &Hull, &Allegiance)>()
        .iter()
        .map(|(entity, (ship, state, spec, hull, allegiance))| ShipSample {
            entity,
            id: ship.id,
            side: allegiance.side,
            squad: allegiance.squad,
            state: *state,
            spec: *spec,
            hull: *hull,
            radius: hull_radius(spec),
        })
        .collect();
    samples.sort_by_key(|s| s.id);
    samples
}

pub fn collect_obstacles(world: &World) -> Vec<Obstacle> {
    world.query::<&Obstacle>().iter().map(|(_, o)| *o).collect()
}

/// What one observer can query this tick.
pub struct WorldView<'a> {
    side: Side,
    ships: &'a [ShipSample],
    obstacles: &'a [Obstacle],
    neighbors: Vec<BodyInfo>,
}

impl<'a> WorldView<'a> {
    pub fn new(observer: &ShipSample, ships: &'a [ShipSample], obstacles: &'a [Obstacle]) -> Self {
        let neighbors = ships
            .iter()
            .filter(|s| s.id != observer.id)
            .map(|s| info(observer.side, s))
            .collect();
        Self {
            side: observer.side,
            ships,
            obstacles,
            neighbors,
        }
    }
}

fn info(observer: Side, sample: &ShipSample) -> BodyInfo {
    BodyInfo {
        id: sample.id,
        position: sample.state.position,
        velocity: sample.state.velocity,
        yaw: sample.state.yaw,
        attitude: observer.attitude_toward(sample.side),
        movable: true,
    }
}

impl WorldQuery for WorldView<'_> {
    fn raycast(&self, from: Vec3, to: Vec3, exclude: &[BodyId]) -> Option<RayHit> {
        let rocks = self
            .obstacles
            .iter()
            .filter_map(|o| intersect_sphere(from, to, o.center, o.radius));
        let hulls = self
            .ships
            .iter()
            .filter(|s| !exclude.contains(&s.id))
            .filter_map(|s| {
                intersect_sphere(from, to, s.state.position, s.radius).map(|hit| RayHit {
                    body: Some(s.id),
                    ..hit
                })
            });
        rocks
            .chain(hulls)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn body(&self, id: BodyId) -> Option<BodyInfo> {
        self.ships
            .iter()
            .find(|s| s.id == id)
            .map(|s| info(self.side, s))
    }

    fn neighbors(&self) -> &[BodyInfo] {
        &self.neighbors
    }
}
