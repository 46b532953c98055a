//! The per-tree provider table.

use narrative_state::ProviderId;

use super::Provider;

/// One id or a set of ids to register a definition under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderIds(Vec<String>);

impl ProviderIds {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ProviderIds {
    fn from(id: &str) -> Self {
        Self(vec![id.to_string()])
    }
}

impl From<String> for ProviderIds {
    fn from(id: String) -> Self {
        Self(vec![id])
    }
}

impl From<&String> for ProviderIds {
    fn from(id: &String) -> Self {
        Self(vec![id.clone()])
    }
}

impl From<ProviderId> for ProviderIds {
    fn from(id: ProviderId) -> Self {
        Self(vec![id.into()])
    }
}

impl From<Vec<String>> for ProviderIds {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

impl From<Vec<&str>> for ProviderIds {
    fn from(ids: Vec<&str>) -> Self {
        Self(ids.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ProviderIds {
    fn from(ids: &[&str]) -> Self {
        Self(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ProviderIds {
    fn from(ids: [&str; N]) -> Self {
        Self(ids.iter().map(|id| id.to_string()).collect())
    }
}

/// Providers of one tree, in registration order.
///
/// Replacing a provider keeps its position. Tables are small, so lookups scan.
#[derive(Debug, Default)]
pub struct ProviderTable {
    providers: Vec<Provider>,
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a provider, replacing any entry with the same id. Returns the
    /// replaced entry.
    pub fn insert(&mut self, provider: Provider) -> Option<Provider> {
        match self
            .providers
            .iter_mut()
            .find(|existing| existing.id() == provider.id())
        {
            Some(slot) => Some(std::mem::replace(slot, provider)),
            None => {
                self.providers.push(provider);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id().as_str() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Provider> {
        self.providers.iter_mut().find(|p| p.id().as_str() == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Provider> {
        let index = self.providers.iter().position(|p| p.id().as_str() == id)?;
        Some(self.providers.remove(index))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Provider> {
        self.providers.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ProviderId> {
        self.providers.iter().map(Provider::id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
