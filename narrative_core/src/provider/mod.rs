//! Providers - named consumers of delta updates.
//!
//! A provider reacts to its own key in a delta: an update value runs its update
//! handler, a clear runs its clear handler. Providers are registered per tree and
//! never persisted, since they carry closures.

mod definition;
mod table;

pub use definition::*;
pub use table::*;
