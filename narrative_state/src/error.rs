//! Error types for the persisted state layer.

use thiserror::Error;

/// Errors raised while building or loading narrative state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Invalid {kind} id: {value:?} is blank")]
    InvalidId { kind: &'static str, value: String },

    #[error("Unknown end policy: {0:?} (expected no-repeat, repeat-last or repeat)")]
    UnknownPolicy(String),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Configuration file error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type StateResult<T> = Result<T, StateError>;
