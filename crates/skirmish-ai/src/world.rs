//! The narrow interface between the AI core and the world it flies in.
//!
//! The host implements [`WorldQuery`] over whatever physics engine it uses.
//! Everything here is read-only: the core never mutates another body.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use skirmish_core::enums::{Attitude, HardpointKind};
use skirmish_core::types::{yaw_to_forward, BodyId};

/// Read-only view of another body, resolved once by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyInfo {
    pub id: BodyId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    /// Disposition toward the querying agent's side.
    pub attitude: Attitude,
    /// Rigid, moving body (ships) as opposed to static scenery.
    pub movable: bool,
}

impl BodyInfo {
    pub fn forward(&self) -> Vec3 {
        yaw_to_forward(self.yaw)
    }
}

/// Closest intersection of a ray with world geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin.
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    /// Body that was hit, if it is a tracked body.
    pub body: Option<BodyId>,
}

/// A weapon mount the weapon system reports as in range this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hardpoint {
    pub kind: HardpointKind,
}

/// World queries the core depends on.
pub trait WorldQuery {
    /// Cast a segment from `from` to `to`, ignoring bodies in `exclude`.
    fn raycast(&self, from: Vec3, to: Vec3, exclude: &[BodyId]) -> Option<RayHit>;

    /// Resolve a handle. `None` means destroyed or detached.
    fn body(&self, id: BodyId) -> Option<BodyInfo>;

    /// Snapshot of every other agent for this tick.
    fn neighbors(&self) -> &[BodyInfo];

    fn line_of_sight(&self, from: Vec3, to: Vec3, exclude: &[BodyId]) -> bool {
        self.raycast(from, to, exclude).is_none()
    }
}

/// A world with nothing in it. Useful for hosts without obstacles.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyWorld;

impl WorldQuery for EmptyWorld {
    fn raycast(&self, _from: Vec3, _to: Vec3, _exclude: &[BodyId]) -> Option<RayHit> {
        None
    }

    fn body(&self, _id: BodyId) -> Option<BodyInfo> {
        None
    }

    fn neighbors(&self) -> &[BodyInfo] {
        &[]
    }
}

/// Segment/sphere intersection used by hosts whose obstacles are spheres.
///
/// A segment starting inside the sphere hits at distance 0.
pub fn intersect_sphere(from: Vec3, to: Vec3, center: Vec3, radius: f32) -> Option<RayHit> {
    let segment = to - from;
    let length = segment.length();
    let dir = segment.try_normalize()?;
    let m = from - center;
    let b = m.dot(dir);
    let c = m.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()).max(0.0);
    if t > length {
        return None;
    }
    let point = from + dir * t;
    Some(RayHit {
        distance: t,
        point,
        normal: (point - center).try_normalize().unwrap_or(-dir),
        body: None,
    })
}
