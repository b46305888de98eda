//! Breadcrumb trail of a pursued target.
//!
//! When the target ducks behind an obstacle the pursuer chases the last
//! place it was seen instead of ramming the obstacle.

use std::collections::VecDeque;

use glam::Vec3;
use tracing::debug;

use skirmish_core::constants::{TRAIL_MAX_AGE, TRAIL_RECORD_INTERVAL};
use skirmish_core::types::BodyId;

use crate::world::WorldQuery;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub position: Vec3,
    pub timestamp_secs: f64,
}

#[derive(Debug, Clone)]
pub struct PursuitTrail {
    points: VecDeque<TrailPoint>,
    record_interval: f64,
    max_age: f64,
    last_record: Option<f64>,
}

impl Default for PursuitTrail {
    fn default() -> Self {
        Self::new(TRAIL_RECORD_INTERVAL, TRAIL_MAX_AGE)
    }
}

impl PursuitTrail {
    pub fn new(record_interval: f64, max_age: f64) -> Self {
        Self {
            points: VecDeque::new(),
            record_interval,
            max_age,
            last_record: None,
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.last_record = None;
    }

    /// Record `position` if the interval has passed, then drop stale points.
    pub fn update(&mut self, position: Vec3, now_secs: f64) {
        let due = self
            .last_record
            .map_or(true, |last| now_secs - last >= self.record_interval);
        if due {
            self.points.push_back(TrailPoint {
                position,
                timestamp_secs: now_secs,
            });
            self.last_record = Some(now_secs);
        }

        let before = self.points.len();
        while let Some(front) = self.points.front() {
            if now_secs - front.timestamp_secs > self.max_age {
                self.points.pop_front();
            } else {
                break;
            }
        }
        let pruned = before - self.points.len();
        if pruned > 0 {
            debug!(pruned, remaining = self.points.len(), "trail pruned");
        }
    }

    /// Where to steer while chasing `target_position` from `from`.
    ///
    /// The target itself when visible; otherwise the newest trail point in
    /// line of sight; otherwise the oldest point we still have.
    pub fn pursuit_point(
        &self,
        from: Vec3,
        target_position: Vec3,
        exclude: &[BodyId],
        world: &dyn WorldQuery,
    ) -> Vec3 {
        if world.line_of_sight(from, target_position, exclude) {
            return target_position;
        }
        self.points
            .iter()
            .rev()
            .find(|p| world.line_of_sight(from, p.position, exclude))
            .or_else(|| self.points.front())
            .map_or(target_position, |p| p.position)
    }
}
