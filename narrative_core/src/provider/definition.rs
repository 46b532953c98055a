//! Provider definitions and the registered provider record.

use narrative_state::{ArgumentMode, Delta, ProviderId};
use serde_json::Value;
use std::rc::Rc;
use tracing::trace;

use crate::dispatch::DispatchContext;
use crate::error::{NarrativeError, ProviderResult, Result};

/// Update handler: shaped arguments, the provider's store, then the context.
pub type UpdateFn = Rc<dyn Fn(&[Value], &mut Value, &mut DispatchContext<'_>) -> ProviderResult>;

/// Clear handler: the provider's store and the context.
pub type ClearFn = Rc<dyn Fn(&mut Value, &mut DispatchContext<'_>) -> ProviderResult>;

/// The registration-time description of a provider.
///
/// Cloning is cheap; handlers are shared.
#[derive(Clone, Default)]
pub struct ProviderDefinition {
    on_update: Option<UpdateFn>,
    on_clear: Option<ClearFn>,
    argument_mode: ArgumentMode,
    clear_on_every_leaf: bool,
    store: Value,
}

impl ProviderDefinition {
    /// Create an empty definition. An update handler must be added before it
    /// can be registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the update handler.
    pub fn on_update<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[Value], &mut Value, &mut DispatchContext<'_>) -> ProviderResult + 'static,
    {
        self.on_update = Some(Rc::new(handler));
        self
    }

    /// Set the clear handler.
    pub fn on_clear<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Value, &mut DispatchContext<'_>) -> ProviderResult + 'static,
    {
        self.on_clear = Some(Rc::new(handler));
        self
    }

    pub fn argument_mode(mut self, mode: ArgumentMode) -> Self {
        self.argument_mode = mode;
        self
    }

    /// `true` passes update values through whole (`ArgumentMode::Single`).
    pub fn skip_args(self, skip: bool) -> Self {
        self.argument_mode(if skip {
            ArgumentMode::Single
        } else {
            ArgumentMode::List
        })
    }

    /// Run the clear handler on every dispatch whose delta lacks this provider.
    pub fn clear_on_every_leaf(mut self, enabled: bool) -> Self {
        self.clear_on_every_leaf = enabled;
        self
    }

    /// Initial value of the provider's own store.
    pub fn store(mut self, store: Value) -> Self {
        self.store = store;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.on_update.is_none() {
            return Err(NarrativeError::Validation(
                "provider definition has no update handler".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the record for one id. Callers validate first.
    pub(crate) fn instantiate(&self, id: ProviderId) -> Result<Provider> {
        let on_update = self.on_update.clone().ok_or_else(|| {
            NarrativeError::Validation(format!("provider {} has no update handler", id))
        })?;

        Ok(Provider {
            id,
            on_update,
            on_clear: self.on_clear.clone(),
            argument_mode: self.argument_mode,
            clear_on_every_leaf: self.clear_on_every_leaf,
            last_delta: None,
            store: self.store.clone(),
        })
    }
}

impl std::fmt::Debug for ProviderDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDefinition")
            .field("has_update", &self.on_update.is_some())
            .field("has_clear", &self.on_clear.is_some())
            .field("argument_mode", &self.argument_mode)
            .field("clear_on_every_leaf", &self.clear_on_every_leaf)
            .finish()
    }
}

/// A provider registered on a tree.
pub struct Provider {
    id: ProviderId,
    on_update: UpdateFn,
    on_clear: Option<ClearFn>,
    argument_mode: ArgumentMode,
    clear_on_every_leaf: bool,
    last_delta: Option<Delta>,
    store: Value,
}

impl Provider {
    pub fn id(&self) -> &ProviderId {
        &self.id
    }

    pub fn argument_mode(&self) -> ArgumentMode {
        self.argument_mode
    }

    pub fn clears_on_every_leaf(&self) -> bool {
        self.clear_on_every_leaf
    }

    pub fn has_clear(&self) -> bool {
        self.on_clear.is_some()
    }

    /// The last delta this provider was dispatched with.
    pub fn last_delta(&self) -> Option<&Delta> {
        self.last_delta.as_ref()
    }

    pub fn store(&self) -> &Value {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Value {
        &mut self.store
    }

    pub(crate) fn observe(&mut self, delta: &Delta) {
        self.last_delta = Some(delta.clone());
    }

    pub(crate) fn update(&mut self, value: &Value, ctx: &mut DispatchContext<'_>) -> Result<()> {
        let args = self.argument_mode.shape(value);
        trace!(provider = %self.id, args = args.len(), "Running update handler");
        (self.on_update)(&args, &mut self.store, ctx).map_err(|source| {
            NarrativeError::Provider {
                provider: self.id.to_string(),
                source,
            }
        })
    }

    pub(crate) fn clear(&mut self, ctx: &mut DispatchContext<'_>) -> Result<()> {
        let Some(on_clear) = &self.on_clear else {
            return Ok(());
        };
        trace!(provider = %self.id, "Running clear handler");
        on_clear(&mut self.store, ctx).map_err(|source| NarrativeError::Provider {
            provider: self.id.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("argument_mode", &self.argument_mode)
            .field("clear_on_every_leaf", &self.clear_on_every_leaf)
            .field("has_clear", &self.on_clear.is_some())
            .field("last_delta", &self.last_delta)
            .field("store", &self.store)
            .finish()
    }
}
