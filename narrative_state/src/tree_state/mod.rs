//! Per-tree persisted state and the store that holds it.
//!
//! This is the only data that crosses the save/restore boundary. It must only be
//! snapshotted between visitations; the engine writes cursors as the last step of
//! a visitation so any snapshot taken from outside sees a consistent store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::delta::Delta;
use crate::error::StateResult;
use crate::ids::{BranchId, TreeId};

/// Persisted state of one tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeState {
    /// Last revealed leaf index per branch. Absent means 0 (nothing revealed).
    #[serde(default)]
    pub log: BTreeMap<BranchId, usize>,

    /// Provider values set by earlier leaves that stay in effect.
    #[serde(default, skip_serializing_if = "Delta::is_empty")]
    pub pending_delta: Delta,
}

impl TreeState {
    /// Create an empty tree state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor for a branch, 0 if it was never visited.
    pub fn cursor(&self, branch: &BranchId) -> usize {
        self.log.get(branch).copied().unwrap_or(0)
    }

    /// Record the cursor for a branch.
    pub fn set_cursor(&mut self, branch: BranchId, cursor: usize) {
        self.log.insert(branch, cursor);
    }

    /// Forget a branch's progress. Returns the cursor it had.
    pub fn reset_branch(&mut self, branch: &BranchId) -> Option<usize> {
        self.log.remove(branch)
    }

    /// Number of branches with recorded progress.
    pub fn branch_count(&self) -> usize {
        self.log.len()
    }
}

/// All persisted tree states, keyed by tree id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateStore {
    trees: BTreeMap<TreeId, TreeState>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state of a tree.
    pub fn get(&self, tree: &TreeId) -> Option<&TreeState> {
        self.trees.get(tree)
    }

    /// Get the state of a tree mutably.
    pub fn get_mut(&mut self, tree: &TreeId) -> Option<&mut TreeState> {
        self.trees.get_mut(tree)
    }

    /// Get the state for a tree, creating an empty one if needed.
    pub fn ensure(&mut self, tree: TreeId) -> &mut TreeState {
        self.trees.entry(tree).or_default()
    }

    /// Insert a tree's state, returning the one it replaced.
    pub fn insert(&mut self, tree: TreeId, state: TreeState) -> Option<TreeState> {
        self.trees.insert(tree, state)
    }

    /// Remove a tree's state.
    pub fn remove(&mut self, tree: &TreeId) -> Option<TreeState> {
        self.trees.remove(tree)
    }

    /// Check if a tree has state.
    pub fn contains(&self, tree: &TreeId) -> bool {
        self.trees.contains_key(tree)
    }

    /// Number of trees with state.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Check if the store holds no trees.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Iterate tree ids in order.
    pub fn tree_ids(&self) -> impl Iterator<Item = &TreeId> {
        self.trees.keys()
    }

    /// Serialize the whole store for the host's save slot.
    pub fn to_json(&self) -> StateResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuild a store from a host save slot.
    pub fn from_json(json: &str) -> StateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
