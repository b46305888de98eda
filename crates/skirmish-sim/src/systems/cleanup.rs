//! Cleanup system: removes ships whose hull is gone.

use hecs::{Entity, World};
use tracing::info;

use skirmish_core::types::BodyId;

use crate::components::{Hull, Ship};

/// Despawn destroyed ships and return their ids.
/// Uses a pre-allocated buffer to avoid per-tick allocation.
pub fn run(world: &mut World, despawn_buffer: &mut Vec<Entity>) -> Vec<BodyId> {
    despawn_buffer.clear();
    let mut destroyed = Vec::new();

    for (entity, (ship, hull)) in world.query_mut::<(&Ship, &Hull)>() {
        if hull.health <= 0.0 {
            despawn_buffer.push(entity);
            destroyed.push(ship.id);
        }
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
    for id in &destroyed {
        info!(ship = %id, "ship destroyed");
    }
    destroyed
}
