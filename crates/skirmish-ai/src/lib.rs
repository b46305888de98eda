//! Autonomous agent control for SKIRMISH.
//!
//! Layers, leaves first: context-steering navigation, formation slots,
//! arrival/PD piloting, utility decisions, and the per-agent controller
//! that ties them together. The host reaches the world only through
//! [`world::WorldQuery`] and feeds ship state in each tick.

pub mod agent;
pub mod config;
pub mod considerations;
pub mod controller;
pub mod decision;
pub mod error;
pub mod formation;
pub mod navigation;
pub mod pilot;
pub mod trail;
pub mod world;

pub use skirmish_core as core;

pub use controller::{AgentController, AgentOutput, FireIntent, TickInput};

#[cfg(test)]
mod tests;
