//! ECS systems that operate on the battle world each tick.
//!
//! Systems are plain functions over `&mut World` (or `&World` for read-only
//! passes). They own no state; all state lives in components.

pub mod agents;
pub mod cleanup;
pub mod movement;
pub mod snapshot;
