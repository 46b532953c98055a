//! Error types for the branching engine.

use narrative_state::{StateError, TreeId};
use thiserror::Error;

/// Error returned by provider handlers and host renderers.
///
/// The engine never swallows these: a failing handler aborts the dispatch and the
/// error reaches whoever started it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error with a message.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type ProviderResult = std::result::Result<(), ProviderError>;

/// Errors surfaced by registration, update and visitation calls.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Tree not found: {0}")]
    TreeNotFound(TreeId),

    #[error("Branch not found in tree {tree}: {branch}")]
    BranchNotFound { tree: TreeId, branch: String },

    #[error("Malformed argument on leaf {leaf} ({raw:?}): {reason}")]
    MalformedArgument {
        leaf: usize,
        raw: String,
        reason: String,
    },

    #[error("Provider {provider} failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("State error: {0}")]
    State(StateError),
}

impl From<StateError> for NarrativeError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::InvalidId { .. } | StateError::UnknownPolicy(_) => {
                NarrativeError::Validation(err.to_string())
            }
            other => NarrativeError::State(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, NarrativeError>;
