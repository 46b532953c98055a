//! Trees - named provider tables sharing one update channel.

mod render;

pub use render::*;

use narrative_state::{Delta, ProviderId, TreeId, DEFAULT_PROVIDER_ID};
use serde_json::Value;
use tracing::{debug, info};

use crate::dispatch::{dispatch, DispatchContext};
use crate::error::{NarrativeError, Result};
use crate::provider::{Provider, ProviderDefinition, ProviderIds, ProviderTable};

/// A tree and its providers.
///
/// Every tree has exactly one provider under its default id, the built-in
/// renderer unless replaced through [`Tree::register_default`].
#[derive(Debug)]
pub struct Tree {
    id: TreeId,
    default_id: ProviderId,
    providers: ProviderTable,
}

impl Tree {
    /// Create a tree using the standard default provider id.
    pub fn new(id: TreeId) -> Result<Self> {
        Self::with_default_id(id, ProviderId::new(DEFAULT_PROVIDER_ID)?)
    }

    /// Create a tree whose built-in renderer lives under `default_id`.
    pub fn with_default_id(id: TreeId, default_id: ProviderId) -> Result<Self> {
        let mut providers = ProviderTable::new();
        providers.insert(render_provider().instantiate(default_id.clone())?);
        Ok(Self {
            id,
            default_id,
            providers,
        })
    }

    pub fn id(&self) -> &TreeId {
        &self.id
    }

    /// The reserved provider id; also the delta key carrying leaf content.
    pub fn default_provider_id(&self) -> &ProviderId {
        &self.default_id
    }

    /// Register a definition under one or more ids.
    ///
    /// Each id gets its own copy of the definition. Every id is validated before
    /// anything is committed, so a failing call leaves the table unchanged.
    pub fn register_provider(
        &mut self,
        ids: impl Into<ProviderIds>,
        definition: ProviderDefinition,
    ) -> Result<&mut Self> {
        let ids = ids.into();
        if ids.is_empty() {
            return Err(NarrativeError::Validation(
                "no provider ids given".to_string(),
            ));
        }
        definition.validate()?;

        let ids = ids
            .iter()
            .map(|id| ProviderId::new(id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let providers = ids
            .into_iter()
            .map(|id| definition.instantiate(id))
            .collect::<Result<Vec<_>>>()?;

        for provider in providers {
            let id = provider.id().clone();
            let replaced = self.providers.insert(provider).is_some();
            info!(tree = %self.id, provider = %id, replaced, "Registered provider");
        }
        Ok(self)
    }

    /// Replace the provider under the default id.
    pub fn register_default(&mut self, definition: ProviderDefinition) -> Result<&mut Self> {
        let id = self.default_id.clone();
        self.register_provider(id, definition)
    }

    /// Remove a provider. The default provider cannot be removed.
    pub fn remove_provider(&mut self, id: &str) -> Result<Option<Provider>> {
        if id == self.default_id.as_str() {
            return Err(NarrativeError::Validation(format!(
                "the default provider {} cannot be removed",
                id
            )));
        }
        let removed = self.providers.remove(id);
        if removed.is_some() {
            debug!(tree = %self.id, provider = id, "Removed provider");
        }
        Ok(removed)
    }

    pub fn provider(&self, id: &str) -> Option<&Provider> {
        self.providers.get(id)
    }

    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter()
    }

    pub fn provider_ids(&self) -> impl Iterator<Item = &ProviderId> {
        self.providers.ids()
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn has_provider(&self, id: &str) -> bool {
        self.providers.contains(id)
    }

    pub fn provider_store(&self, id: &str) -> Option<&Value> {
        self.providers.get(id).map(Provider::store)
    }

    pub fn provider_store_mut(&mut self, id: &str) -> Option<&mut Value> {
        self.providers.get_mut(id).map(Provider::store_mut)
    }

    /// Dispatch a delta to every provider of this tree.
    pub fn update(&mut self, delta: &Delta, ctx: &mut DispatchContext<'_>) -> Result<()> {
        dispatch(&mut self.providers, delta, ctx)
    }
}
