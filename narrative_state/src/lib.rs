//! # Narrative State
//!
//! The persisted half of the branching engine. This crate holds every value that
//! has to survive a save/restore cycle (branch cursors and pending deltas) together
//! with the plain data types the engine dispatches on. Nothing in here carries a
//! callable, so all of it round-trips through serde.

pub mod config;
pub mod delta;
pub mod error;
pub mod ids;
pub mod policy;
pub mod tree_state;

pub use config::*;
pub use delta::*;
pub use error::*;
pub use ids::*;
pub use policy::*;
pub use tree_state::*;
