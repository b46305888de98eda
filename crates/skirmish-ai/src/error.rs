//! Per-tick failure reasons and tuning rejections.
//!
//! None of the tick errors are fatal. `AgentController::tick` turns them
//! into a logged no-op with neutral control outputs.

use thiserror::Error;

use skirmish_core::types::BodyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("agent {0} has no physical state")]
    MissingShipState(BodyId),

    #[error("agent {0} has no ship spec")]
    MissingShipSpec(BodyId),
}

pub type ControlResult<T> = Result<T, ControlError>;

/// Tuning values the controller cannot run with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field}: min {min} is greater than max {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}
