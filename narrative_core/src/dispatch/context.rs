//! The context handed to every provider handler during a dispatch.

use narrative_state::{BranchId, TreeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProviderResult;
use crate::host::Renderer;
use crate::traversal::{Leaf, Visitation};

/// Unique identifier for one visitation, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitId(pub Uuid);

impl VisitId {
    /// Create a new random visit ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VisitId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VisitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The branch position a dispatch was triggered from.
#[derive(Debug, Clone, Copy)]
pub struct LeafView<'a> {
    pub visit_id: VisitId,
    pub branch_id: &'a BranchId,
    pub leaves: &'a [Leaf],
    /// Index of the leaf being revealed.
    pub current: usize,
}

impl<'a> LeafView<'a> {
    /// The leaf being revealed.
    pub fn current_leaf(&self) -> Option<&'a Leaf> {
        self.leaves.get(self.current)
    }

    /// Contents of leaves 1 through the current one. Leaf 0 is the preamble.
    pub fn revealed(&self) -> impl Iterator<Item = &'a str> + 'a {
        let end = (self.current + 1).min(self.leaves.len());
        let leaves = self.leaves;
        leaves
            .get(1..end)
            .unwrap_or(&[])
            .iter()
            .map(|leaf| leaf.content.as_str())
    }
}

/// Everything a provider handler may look at or call back into.
pub struct DispatchContext<'a> {
    tree_id: &'a TreeId,
    leaf: Option<LeafView<'a>>,
    renderer: &'a mut dyn Renderer,
    separator: &'a str,
    deferred: Vec<Visitation>,
}

impl<'a> DispatchContext<'a> {
    /// Context for an update that did not come from a visitation.
    pub fn detached(tree_id: &'a TreeId, renderer: &'a mut dyn Renderer) -> Self {
        Self {
            tree_id,
            leaf: None,
            renderer,
            separator: "",
            deferred: Vec::new(),
        }
    }

    /// Context for the dispatch of a revealed leaf.
    pub fn for_leaf(
        tree_id: &'a TreeId,
        leaf: LeafView<'a>,
        renderer: &'a mut dyn Renderer,
        separator: &'a str,
    ) -> Self {
        Self {
            tree_id,
            leaf: Some(leaf),
            renderer,
            separator,
            deferred: Vec::new(),
        }
    }

    pub fn tree_id(&self) -> &TreeId {
        self.tree_id
    }

    /// The branch position, if this dispatch came from a visitation.
    pub fn leaf(&self) -> Option<&LeafView<'a>> {
        self.leaf.as_ref()
    }

    pub fn branch_id(&self) -> Option<&BranchId> {
        self.leaf.as_ref().map(|view| view.branch_id)
    }

    /// Index of the leaf being revealed.
    pub fn current_leaf_index(&self) -> Option<usize> {
        self.leaf.as_ref().map(|view| view.current)
    }

    pub fn visit_id(&self) -> Option<VisitId> {
        self.leaf.as_ref().map(|view| view.visit_id)
    }

    /// All content revealed in this branch so far, joined by the configured
    /// separator.
    pub fn revealed_text(&self) -> Option<String> {
        self.leaf
            .as_ref()
            .map(|view| view.revealed().collect::<Vec<_>>().join(self.separator))
    }

    /// Ask the host to render text.
    pub fn render(&mut self, text: &str) -> ProviderResult {
        self.renderer.render(text)
    }

    /// Queue a visitation to run once the current one has been persisted.
    ///
    /// The engine is busy while handlers run, so a handler cannot visit a branch
    /// directly. Deferred visits start after the whole fan-out has finished and
    /// see the cursor this visitation writes.
    pub fn defer(&mut self, visitation: Visitation) {
        self.deferred.push(visitation);
    }

    pub fn deferred(&self) -> &[Visitation] {
        &self.deferred
    }

    pub(crate) fn into_deferred(self) -> Vec<Visitation> {
        self.deferred
    }
}
