//! Identifiers for trees, branches and providers.
//!
//! All three are non-blank strings. Construction trims nothing; it only refuses
//! values that are empty or whitespace-only, so authored ids stay byte-for-byte
//! what the author wrote.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

use crate::error::{StateError, StateResult};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create an id, rejecting blank input.
            pub fn new(value: impl Into<String>) -> StateResult<Self> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(StateError::InvalidId {
                        kind: $kind,
                        value,
                    });
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = StateError;

            fn try_from(value: String) -> StateResult<Self> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = StateError;

            fn try_from(value: &str) -> StateResult<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a tree: a named set of providers sharing one update channel.
    TreeId,
    "tree"
);

string_id!(
    /// Identifier of a branch within a tree's authored content.
    BranchId,
    "branch"
);

string_id!(
    /// Identifier of a provider, and the delta key it reacts to.
    ProviderId,
    "provider"
);
