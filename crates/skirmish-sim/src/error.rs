//! Host-side errors. The agent core itself never fails a tick.

use thiserror::Error;

use skirmish_ai::error::ConfigError;
use skirmish_core::types::BodyId;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("no agent with id {0}")]
    UnknownAgent(BodyId),

    #[error("no squad with id {0}")]
    UnknownSquad(u32),

    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),
}

pub type SimResult<T> = Result<T, SimError>;
