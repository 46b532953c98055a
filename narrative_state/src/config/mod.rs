//! Engine configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::StateResult;
use crate::policy::EndPolicy;

/// Reserved provider id for the built-in renderer.
pub const DEFAULT_PROVIDER_ID: &str = "default";

/// Configuration for the branching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Policy used when a visitation does not name one.
    #[serde(default)]
    pub default_end_policy: EndPolicy,

    /// Carry per-leaf provider values into later leaves.
    #[serde(default = "default_true")]
    pub persist_pending_delta: bool,

    /// Drop carried values when a `repeat` branch starts over.
    #[serde(default = "default_true")]
    pub reset_pending_on_restart: bool,

    /// Provider id (and delta key) of the built-in renderer.
    #[serde(default = "default_provider_id")]
    pub default_provider_id: String,

    /// Joins leaf contents when the built-in renderer shows a branch so far.
    #[serde(default)]
    pub render_separator: String,
}

fn default_true() -> bool {
    true
}

fn default_provider_id() -> String {
    DEFAULT_PROVIDER_ID.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_end_policy: EndPolicy::default(),
            persist_pending_delta: default_true(),
            reset_pending_on_restart: default_true(),
            default_provider_id: default_provider_id(),
            render_separator: String::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text. Missing fields take defaults.
    pub fn from_toml_str(text: &str) -> StateResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> StateResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
