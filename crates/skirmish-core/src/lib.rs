//! Core types and definitions for the SKIRMISH agent simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! kinematic state, ship specs, AI enums, squad orders, agent commands,
//! diagnostic events, snapshots, and tuning constants.
//! It has no AI logic and no dependency on any ECS or runtime framework.

pub mod commands;
pub mod constants;
pub mod enums;
pub mod events;
pub mod state;
pub mod types;
