//! End-of-sequence policies and provider argument modes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::StateError;

/// What a branch does when its cursor would advance past the last leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EndPolicy {
    /// Stop silently: no dispatch, no state change.
    NoRepeat,
    /// Reveal the final leaf again.
    #[default]
    RepeatLast,
    /// Start over from leaf 1.
    Repeat,
}

impl EndPolicy {
    /// The directive flag spelling of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            EndPolicy::NoRepeat => "no-repeat",
            EndPolicy::RepeatLast => "repeat-last",
            EndPolicy::Repeat => "repeat",
        }
    }
}

impl FromStr for EndPolicy {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "no-repeat" => Ok(EndPolicy::NoRepeat),
            "repeat-last" => Ok(EndPolicy::RepeatLast),
            "repeat" => Ok(EndPolicy::Repeat),
            other => Err(StateError::UnknownPolicy(other.to_string())),
        }
    }
}

impl std::fmt::Display for EndPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an update value is turned into handler arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentMode {
    /// The value is passed through as the only argument.
    Single,
    /// An array value is spread into positional arguments; anything else
    /// becomes a one-element list.
    #[default]
    List,
}

impl ArgumentMode {
    /// Shape an update value into the positional arguments a handler receives.
    pub fn shape(&self, value: &Value) -> Vec<Value> {
        match (self, value) {
            (ArgumentMode::List, Value::Array(items)) => items.clone(),
            _ => vec![value.clone()],
        }
    }
}
