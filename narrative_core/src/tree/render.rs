//! The built-in render provider.

use tracing::trace;

use crate::provider::ProviderDefinition;

/// Definition of the provider registered under the default id of every tree.
///
/// It ignores its update value and renders every leaf revealed so far in the
/// branch, so each visit shows one more chunk than the last. Outside a
/// visitation there is nothing to render.
pub fn render_provider() -> ProviderDefinition {
    ProviderDefinition::new()
        .skip_args(true)
        .on_update(|_, _, ctx| match ctx.revealed_text() {
            Some(text) => ctx.render(&text),
            None => {
                trace!(tree = %ctx.tree_id(), "No branch position, nothing to render");
                Ok(())
            }
        })
}
