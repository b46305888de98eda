//! Headless host for the SKIRMISH agent core.
//!
//! Owns the hecs ECS world of ships and obstacles, stands in for physics,
//! world queries and squad coordination, and produces `BattleSnapshot`s.
//! Deterministic for a given seed.

pub mod components;
pub mod engine;
pub mod error;
pub mod scenario;
pub mod squad;
pub mod systems;
pub mod world_setup;
pub mod world_view;

pub use engine::{BattleCommand, SimConfig, SimulationEngine};
pub use error::{SimError, SimResult};
pub use skirmish_core as core;
