//! # Narrative Core
//!
//! A branching engine for authored narrative. A branch is an ordered list of
//! leaves; each visit reveals the next leaf and fans a delta out to the providers
//! registered on the branch's tree, which react to their own keys (swap a sprite,
//! play a sound) while the built-in renderer shows the text revealed so far.
//!
//! ## Core Components
//!
//! - **provider**: Provider definitions and the per-tree provider table
//! - **dispatch**: The dispatch engine and the context handlers receive
//! - **traversal**: The branch cursor state machine and visitation types
//! - **tree**: Trees and the built-in render provider
//! - **engine**: The registry, state store and visitation pipeline
//! - **host**: Traits for the host renderer and argument evaluator
//!
//! ## Design Philosophy
//!
//! - **Explicit context**: All registries live in an [`Engine`] value, never in globals
//! - **Persist last**: Cursors are written only after a dispatch fully succeeds
//! - **Loud failures**: Handler errors propagate instead of being swallowed

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod host;
pub mod provider;
pub mod traversal;
pub mod tree;

pub use dispatch::*;
pub use engine::*;
pub use error::*;
pub use host::*;
pub use provider::*;
pub use traversal::*;
pub use tree::*;

pub use narrative_state;
