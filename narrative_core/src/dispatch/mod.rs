//! Dispatch engine - fans a delta out to every provider of a tree.
//!
//! For each provider, in registration order:
//! 1. **Observe**: the delta is recorded as the provider's last delta
//! 2. **Clear**: a `Clear` entry runs the clear handler (never the update handler)
//! 3. **Update**: an `Update` entry runs the update handler with shaped arguments
//! 4. **Absent**: no entry runs the clear handler only for providers that clear
//!    on every leaf
//!
//! The first handler error stops the fan-out and is returned.

mod context;

pub use context::*;

use narrative_state::{Delta, DeltaValue};
use tracing::debug;

use crate::error::Result;
use crate::provider::ProviderTable;

/// Dispatch `delta` to every provider in `table`.
pub fn dispatch(
    table: &mut ProviderTable,
    delta: &Delta,
    ctx: &mut DispatchContext<'_>,
) -> Result<()> {
    debug!(
        tree = %ctx.tree_id(),
        providers = table.len(),
        keys = delta.len(),
        "Dispatching delta"
    );

    for provider in table.iter_mut() {
        provider.observe(delta);

        match delta.get(provider.id().as_str()) {
            Some(DeltaValue::Clear) => provider.clear(ctx)?,
            Some(DeltaValue::Update(value)) => provider.update(value, ctx)?,
            None if provider.clears_on_every_leaf() => provider.clear(ctx)?,
            None => {}
        }
    }

    Ok(())
}
