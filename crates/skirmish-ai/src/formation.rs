//! Formation slot geometry and squad assignment.
//!
//! Offsets live in the leader's local frame: +X is the leader's right and
//! +Z is behind the leader. Slot 0 is the leader itself.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use skirmish_core::constants::MAX_FORMATION_SLOT;
use skirmish_core::enums::FormationPattern;
use skirmish_core::types::{rotate_by_yaw, BodyId};

use crate::config::FormationConfig;

/// One wingman's slot, as produced by [`FormationSolver::assign`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub ship: BodyId,
    pub slot: usize,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationSolver {
    pub spacing: f32,
    pub depth: f32,
}

impl Default for FormationSolver {
    fn default() -> Self {
        Self::new(&FormationConfig::default())
    }
}

impl FormationSolver {
    pub fn new(config: &FormationConfig) -> Self {
        Self {
            spacing: config.spacing,
            depth: config.depth,
        }
    }

    /// Local offset of `slot`. Slots past [`MAX_FORMATION_SLOT`] are clamped.
    pub fn offset(&self, slot: usize, pattern: FormationPattern) -> Vec3 {
        let slot = slot.min(MAX_FORMATION_SLOT);
        if slot == 0 {
            return Vec3::ZERO;
        }
        match pattern {
            FormationPattern::Line => Vec3::new(0.0, 0.0, self.depth * slot as f32),
            FormationPattern::Wedge => self.wedge(slot),
            FormationPattern::Diamond => self.diamond(slot),
            FormationPattern::Echelon => {
                Vec3::new(0.7 * self.spacing * slot as f32, 0.0, self.depth * slot as f32)
            }
            FormationPattern::Spread => {
                let side = if slot % 2 == 1 { -1.0 } else { 1.0 };
                let distance = slot.div_ceil(2) as f32;
                Vec3::new(side * self.spacing * distance, 0.0, 0.0)
            }
        }
    }

    // Row r holds r + 1 ships and starts at slot r(r+1)/2.
    fn wedge(&self, slot: usize) -> Vec3 {
        let row = ((((1 + 8 * slot) as f32).sqrt() - 1.0) / 2.0).floor() as usize;
        let row_start = row * (row + 1) / 2;
        let pos_in_row = slot - row_start;
        let x = (pos_in_row as f32 - row as f32 / 2.0) * self.spacing;
        Vec3::new(x, 0.0, row as f32 * self.depth)
    }

    fn diamond(&self, slot: usize) -> Vec3 {
        let (s, d) = (self.spacing, self.depth);
        match slot {
            1 => Vec3::new(-s, 0.0, d),
            2 => Vec3::new(s, 0.0, d),
            3 => Vec3::new(0.0, 0.0, 2.0 * d),
            4 => Vec3::new(-2.0 * s, 0.0, 2.0 * d),
            5 => Vec3::new(2.0 * s, 0.0, 2.0 * d),
            // Tail column behind the diamond.
            n => Vec3::new(0.0, 0.0, d * (n - 3) as f32),
        }
    }

    pub fn world_position(
        &self,
        slot: usize,
        pattern: FormationPattern,
        leader_position: Vec3,
        leader_yaw: f32,
    ) -> Vec3 {
        leader_position + rotate_by_yaw(self.offset(slot, pattern), leader_yaw)
    }

    /// Formation members face the way the leader faces.
    pub fn orientation(&self, _slot: usize, leader_yaw: f32) -> f32 {
        leader_yaw
    }

    /// World positions of slots `0..count`.
    pub fn positions(
        &self,
        count: usize,
        pattern: FormationPattern,
        leader_position: Vec3,
        leader_yaw: f32,
    ) -> Vec<Vec3> {
        (0..count)
            .map(|slot| self.world_position(slot, pattern, leader_position, leader_yaw))
            .collect()
    }

    /// Greedy nearest-ship assignment.
    ///
    /// Slots are filled in increasing order starting at `first_slot`; each
    /// takes the closest ship not yet assigned. Not an optimal matching, but
    /// it avoids most path crossings. Returns one entry per ship.
    pub fn assign(
        &self,
        pattern: FormationPattern,
        leader_position: Vec3,
        leader_yaw: f32,
        ships: &[(BodyId, Vec3)],
        first_slot: usize,
    ) -> Vec<SlotAssignment> {
        let mut taken = vec![false; ships.len()];
        let mut out = Vec::with_capacity(ships.len());

        for slot in first_slot..first_slot + ships.len() {
            let position = self.world_position(slot, pattern, leader_position, leader_yaw);
            let nearest = ships
                .iter()
                .enumerate()
                .filter(|(i, _)| !taken[*i])
                .min_by(|(_, a), (_, b)| {
                    a.1.distance_squared(position)
                        .total_cmp(&b.1.distance_squared(position))
                });
            if let Some((i, &(ship, _))) = nearest {
                taken[i] = true;
                out.push(SlotAssignment {
                    ship,
                    slot,
                    position,
                });
            }
        }
        out
    }
}
