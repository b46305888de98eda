//! Context steering.
//!
//! A fan of rays around the agent scores every candidate direction by how
//! well it points at the goal (interest) and how close it runs into
//! something (danger). The best net score wins. Purely local: a large
//! concave obstacle can trap an agent.

use std::f32::consts::TAU;

use glam::Vec3;

use skirmish_core::constants::EPSILON;
use skirmish_core::types::{flatten, yaw_to_forward, BodyId, ShipState};

use crate::config::NavigationConfig;
use crate::world::WorldQuery;

/// Per-agent context map. The arrays are rebuilt on every query; only the
/// last chosen direction survives between queries.
#[derive(Debug, Clone)]
pub struct NavigationField {
    config: NavigationConfig,
    directions: Vec<Vec3>,
    interest: Vec<f32>,
    danger: Vec<f32>,
    last_direction: Vec3,
}

impl Default for NavigationField {
    fn default() -> Self {
        Self::new(NavigationConfig::default())
    }
}

impl NavigationField {
    pub fn new(config: NavigationConfig) -> Self {
        let count = config.ray_count.max(4).next_power_of_two();
        let directions = (0..count)
            .map(|i| yaw_to_forward(i as f32 * TAU / count as f32))
            .collect();
        Self {
            config,
            directions,
            interest: vec![0.0; count],
            danger: vec![0.0; count],
            last_direction: Vec3::NEG_Z,
        }
    }

    pub fn ray_count(&self) -> usize {
        self.directions.len()
    }

    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    pub fn interest(&self) -> &[f32] {
        &self.interest
    }

    pub fn danger(&self) -> &[f32] {
        &self.danger
    }

    pub fn last_direction(&self) -> Vec3 {
        self.last_direction
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Ray length for a given speed.
    pub fn lookahead(&self, speed: f32) -> f32 {
        self.config
            .base_lookahead
            .max(speed * self.config.speed_lookahead_factor)
            .min(self.config.max_lookahead)
    }

    /// Best planar unit direction from `ship` toward `goal`.
    ///
    /// Rays ignore `self_id` and everything in `ignore`.
    pub fn best_direction(
        &mut self,
        ship: &ShipState,
        goal: Vec3,
        self_id: BodyId,
        ignore: &[BodyId],
        current_speed: f32,
        world: &dyn WorldQuery,
    ) -> Vec3 {
        let Some(goal_dir) = flatten(goal - ship.position).try_normalize() else {
            self.last_direction = ship.forward();
            return self.last_direction;
        };

        let mut exclude = Vec::with_capacity(ignore.len() + 1);
        exclude.push(self_id);
        exclude.extend_from_slice(ignore);

        let lookahead = self.lookahead(current_speed);
        let count = self.directions.len();
        let smear = self.config.danger_smear.min(count / 2);

        for i in 0..count {
            self.interest[i] = self.directions[i].dot(goal_dir).max(0.0);
            self.danger[i] = 0.0;
        }

        for i in 0..count {
            let end = ship.position + self.directions[i] * lookahead;
            let Some(hit) = world.raycast(ship.position, end, &exclude) else {
                continue;
            };
            let closeness = ((lookahead - hit.distance) / lookahead).clamp(0.0, 1.0);
            let raw = closeness * closeness;
            if raw <= 0.0 {
                continue;
            }
            self.danger[i] = self.danger[i].max(raw);
            // Obstacles are wider than one ray: neighbours get a decaying copy.
            for k in 1..=smear {
                let falloff = raw * (smear + 1 - k) as f32 / (smear + 1) as f32;
                let left = (i + k) % count;
                let right = (i + count - k) % count;
                self.danger[left] = self.danger[left].max(falloff);
                self.danger[right] = self.danger[right].max(falloff);
            }
        }

        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        let mut worst_score = f32::INFINITY;
        for i in 0..count {
            let score = self.interest[i] - self.danger[i] * self.config.danger_penalty;
            if score > best_score {
                best_score = score;
                best = i;
            }
            worst_score = worst_score.min(score);
        }

        self.last_direction = if best_score - worst_score < EPSILON {
            goal_dir
        } else {
            self.directions[best]
        };
        self.last_direction
    }
}
