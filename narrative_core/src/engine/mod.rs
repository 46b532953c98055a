//! The engine - owns the tree registry, the state store and the host
//! collaborators, and runs visitations.
//!
//! A visitation runs to completion before control returns:
//! 1. **Resolve**: find the tree and check the branch is visitable
//! 2. **Step**: pick the next leaf from the cursor and the end policy
//! 3. **Evaluate**: turn the leaf's argument expression into a delta
//! 4. **Merge**: pending values, then leaf values, then the leaf content under
//!    the default provider key
//! 5. **Dispatch**: fan the delta out to the tree's providers
//! 6. **Persist**: write the cursor and pending values
//!
//! Any failure before step 6 leaves the state store untouched.

use narrative_state::{
    BranchId, Delta, EngineConfig, ProviderId, StateStore, TreeId, TreeState,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, error, info, warn};

use crate::dispatch::{DispatchContext, LeafView, VisitId};
use crate::error::{NarrativeError, Result};
use crate::host::{ArgumentEvaluator, JsonArgumentEvaluator, Renderer};
use crate::traversal::{next_step, Step, Transition, VisitOutcome, Visitation};
use crate::tree::Tree;

/// The branching engine.
pub struct Engine {
    config: EngineConfig,
    trees: HashMap<TreeId, Tree>,
    states: StateStore,
    renderer: Box<dyn Renderer>,
    evaluator: Box<dyn ArgumentEvaluator>,
}

impl Engine {
    /// Create an engine with default configuration and JSON leaf arguments.
    pub fn new(renderer: impl Renderer + 'static) -> Self {
        Self::with_config(EngineConfig::default(), renderer)
    }

    /// Create an engine with the given configuration.
    pub fn with_config(config: EngineConfig, renderer: impl Renderer + 'static) -> Self {
        Self {
            config,
            trees: HashMap::new(),
            states: StateStore::new(),
            renderer: Box::new(renderer),
            evaluator: Box::new(JsonArgumentEvaluator),
        }
    }

    /// Replace the leaf argument evaluator.
    pub fn with_evaluator(mut self, evaluator: impl ArgumentEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a new tree with its built-in renderer.
    ///
    /// State restored for this id before registration is kept.
    pub fn register_tree(&mut self, id: &str) -> Result<&mut Tree> {
        let id = TreeId::new(id)?;
        if self.trees.contains_key(&id) {
            return Err(NarrativeError::Validation(format!(
                "tree {} is already registered",
                id
            )));
        }

        let default_id = ProviderId::new(self.config.default_provider_id.as_str())?;
        let tree = Tree::with_default_id(id.clone(), default_id)?;
        self.states.ensure(id.clone());
        info!(tree = %id, "Registered tree");

        Ok(self.trees.entry(id).or_insert(tree))
    }

    pub fn tree(&self, id: &str) -> Option<&Tree> {
        self.trees.get(id)
    }

    pub fn tree_mut(&mut self, id: &str) -> Option<&mut Tree> {
        self.trees.get_mut(id)
    }

    pub fn tree_ids(&self) -> impl Iterator<Item = &TreeId> {
        self.trees.keys()
    }

    /// Delete a tree and its state.
    ///
    /// Returns `true` only when both existed and both were removed. If either is
    /// missing nothing is removed.
    pub fn delete_tree(&mut self, id: &str) -> bool {
        let Ok(id) = TreeId::new(id) else {
            return false;
        };
        if !self.trees.contains_key(&id) || !self.states.contains(&id) {
            warn!(tree = %id, "Refusing to delete tree without both registry and state entries");
            return false;
        }

        self.trees.remove(&id);
        self.states.remove(&id);
        info!(tree = %id, "Deleted tree");
        true
    }

    pub fn state(&self, tree: &str) -> Option<&TreeState> {
        let id = TreeId::new(tree).ok()?;
        self.states.get(&id)
    }

    pub fn states(&self) -> &StateStore {
        &self.states
    }

    /// The cursor of a branch, 0 if never visited.
    pub fn cursor(&self, tree: &str, branch: &str) -> usize {
        match (self.state(tree), BranchId::new(branch)) {
            (Some(state), Ok(branch)) => state.cursor(&branch),
            _ => 0,
        }
    }

    /// Send a branch back to idle. Returns the cursor it had.
    ///
    /// Pending values are dropped too when restarts reset them.
    pub fn reset_branch(&mut self, tree: &str, branch: &str) -> Result<usize> {
        let tree_id = TreeId::new(tree)?;
        let branch_id = BranchId::new(branch)?;
        if !self.trees.contains_key(&tree_id) {
            return Err(NarrativeError::TreeNotFound(tree_id));
        }

        let reset_pending = self.config.reset_pending_on_restart;
        let state = self.states.ensure(tree_id.clone());
        let previous = state.reset_branch(&branch_id).unwrap_or(0);
        if reset_pending {
            state.pending_delta.clear();
        }
        debug!(tree = %tree_id, branch = %branch_id, previous, "Reset branch");
        Ok(previous)
    }

    /// Serialize the state store for the host's save slot.
    pub fn snapshot(&self) -> Result<String> {
        Ok(self.states.to_json()?)
    }

    /// Replace the state store from a host save slot.
    ///
    /// Registered trees missing from the snapshot start from empty state.
    pub fn restore(&mut self, json: &str) -> Result<()> {
        let mut states = StateStore::from_json(json)?;
        for id in self.trees.keys() {
            states.ensure(id.clone());
        }
        self.states = states;
        info!(trees = self.states.len(), "Restored narrative state");
        Ok(())
    }

    /// Dispatch a delta to a tree outside any visitation.
    pub fn update(&mut self, tree: &str, delta: &Delta) -> Result<()> {
        let tree_id = TreeId::new(tree)?;
        let tree = self
            .trees
            .get_mut(&tree_id)
            .ok_or_else(|| NarrativeError::TreeNotFound(tree_id.clone()))?;

        let mut ctx = DispatchContext::detached(&tree_id, &mut *self.renderer);
        tree.update(delta, &mut ctx)?;

        let deferred = ctx.into_deferred();
        self.run_deferred(deferred)
    }

    /// Visit a branch: reveal its next leaf and dispatch it.
    ///
    /// Visitations deferred by providers run afterwards, in order, and see the
    /// cursor written by this one. They do not interleave with the outer
    /// dispatch: every provider sees this leaf before any deferred visit starts.
    ///
    /// A provider that defers a visit on every dispatch keeps this call running.
    /// Under `repeat-last` or `repeat` a branch never stops, so a provider whose
    /// key stays in the pending delta and defers its own branch never returns.
    pub fn visit(&mut self, visitation: Visitation) -> Result<VisitOutcome> {
        let (outcome, deferred) = self.visit_once(&visitation)?;
        self.run_deferred(deferred)?;
        Ok(outcome)
    }

    /// Visit a branch on behalf of a directive.
    ///
    /// Errors are logged and reported to the host as a diagnostic instead of
    /// being returned; `None` means the visitation failed.
    pub fn run_directive(&mut self, visitation: Visitation) -> Option<VisitOutcome> {
        let tree_id = visitation.tree_id.clone();
        let branch_id = visitation.branch_id.clone();

        match self.visit(visitation) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                error!(tree = %tree_id, branch = %branch_id, error = %err, "Visitation failed");
                let diagnostic = format!("[{} / {}] {}", tree_id, branch_id, err);
                if let Err(report_err) = self.renderer.report(&diagnostic) {
                    warn!(error = %report_err, "Could not report diagnostic");
                }
                None
            }
        }
    }

    fn run_deferred(&mut self, deferred: Vec<Visitation>) -> Result<()> {
        let mut queue = VecDeque::from(deferred);
        while let Some(next) = queue.pop_front() {
            debug!(tree = %next.tree_id, branch = %next.branch_id, "Running deferred visitation");
            let (_, more) = self.visit_once(&next)?;
            queue.extend(more);
        }
        Ok(())
    }

    fn visit_once(&mut self, visitation: &Visitation) -> Result<(VisitOutcome, Vec<Visitation>)> {
        let tree_id = &visitation.tree_id;
        let branch_id = &visitation.branch_id;

        let tree = self
            .trees
            .get_mut(tree_id)
            .ok_or_else(|| NarrativeError::TreeNotFound(tree_id.clone()))?;
        if !visitation.is_visitable() {
            return Err(NarrativeError::BranchNotFound {
                tree: tree_id.clone(),
                branch: branch_id.to_string(),
            });
        }

        let policy = visitation.policy.unwrap_or(self.config.default_end_policy);
        let state = self.states.get(tree_id);
        let latest = state.map(|s| s.cursor(branch_id)).unwrap_or(0);

        let (leaf_index, transition) =
            match next_step(latest, visitation.leaves.len(), policy) {
                Step::Reveal { leaf, transition } => (leaf, transition),
                Step::Stop => {
                    debug!(
                        tree = %tree_id,
                        branch = %branch_id,
                        latest,
                        "Branch exhausted, stopping"
                    );
                    return Ok((VisitOutcome::Stopped, Vec::new()));
                }
            };
        let leaf = &visitation.leaves[leaf_index];

        let leaf_delta = self.evaluator.evaluate(&leaf.argument).map_err(|reason| {
            NarrativeError::MalformedArgument {
                leaf: leaf_index,
                raw: leaf.argument.clone(),
                reason,
            }
        })?;

        let restarted = transition == Transition::Restarted;
        let mut pending = match state {
            Some(state)
                if self.config.persist_pending_delta
                    && !(restarted && self.config.reset_pending_on_restart) =>
            {
                state.pending_delta.clone()
            }
            _ => Delta::new(),
        };

        let content_key = tree.default_provider_id().as_str();
        let mut delta = pending.clone();
        delta.merge(&leaf_delta);
        delta.set_update(content_key, Value::String(leaf.content.clone()));
        pending.absorb(&leaf_delta);
        pending.remove(content_key);

        let visit_id = VisitId::new();
        debug!(
            visit = %visit_id,
            tree = %tree_id,
            branch = %branch_id,
            latest,
            leaf = leaf_index,
            ?transition,
            "Revealing leaf"
        );

        let view = LeafView {
            visit_id,
            branch_id,
            leaves: &visitation.leaves,
            current: leaf_index,
        };
        let mut ctx = DispatchContext::for_leaf(
            tree_id,
            view,
            &mut *self.renderer,
            &self.config.render_separator,
        );
        tree.update(&delta, &mut ctx)?;
        let deferred = ctx.into_deferred();

        let state = self.states.ensure(tree_id.clone());
        state.set_cursor(branch_id.clone(), leaf_index);
        if self.config.persist_pending_delta {
            state.pending_delta = pending;
        }

        Ok((
            VisitOutcome::Revealed {
                leaf: leaf_index,
                transition,
            },
            deferred,
        ))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("trees", &self.trees)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::host::Transcript;
    use crate::provider::ProviderDefinition;
    use crate::traversal::Leaf;
    use narrative_state::{DeltaValue, EndPolicy};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn visitation(policy: Option<EndPolicy>) -> Visitation {
        let visitation = Visitation::new(
            TreeId::new("scene").unwrap(),
            BranchId::new("intro").unwrap(),
        )
        .with_leaves([
            Leaf::new("(preamble)"),
            Leaf::new("One. "),
            Leaf::new("Two. "),
        ]);
        match policy {
            Some(policy) => visitation.with_policy(policy),
            None => visitation,
        }
    }

    fn engine() -> (Engine, Transcript) {
        let transcript = Transcript::new();
        let mut engine = Engine::new(transcript.clone());
        engine.register_tree("scene").unwrap();
        (engine, transcript)
    }

    fn visit_n(engine: &mut Engine, visitation: &Visitation, n: usize) -> Vec<VisitOutcome> {
        (0..n)
            .map(|_| engine.visit(visitation.clone()).unwrap())
            .collect()
    }

    #[test]
    fn test_no_repeat_stops_after_last_leaf() {
        let (mut engine, transcript) = engine();
        let v = visitation(Some(EndPolicy::NoRepeat));

        let outcomes = visit_n(&mut engine, &v, 3);

        assert_eq!(outcomes[0].revealed_leaf(), Some(1));
        assert_eq!(outcomes[1].revealed_leaf(), Some(2));
        assert_eq!(outcomes[2], VisitOutcome::Stopped);
        assert_eq!(engine.cursor("scene", "intro"), 2);
        assert_eq!(transcript.rendered(), vec!["One. ", "One. Two. "]);
    }

    #[test]
    fn test_repeat_restarts_at_leaf_one() {
        let (mut engine, transcript) = engine();
        let v = visitation(Some(EndPolicy::Repeat));

        let outcomes = visit_n(&mut engine, &v, 3);

        assert_eq!(
            outcomes[2],
            VisitOutcome::Revealed {
                leaf: 1,
                transition: Transition::Restarted,
            }
        );
        assert_eq!(engine.cursor("scene", "intro"), 1);
        assert_eq!(transcript.last().as_deref(), Some("One. "));
    }

    #[test]
    fn test_repeat_last_redispatches_final_leaf() {
        let (mut engine, transcript) = engine();
        let v = visitation(Some(EndPolicy::RepeatLast));

        visit_n(&mut engine, &v, 3);

        assert_eq!(engine.cursor("scene", "intro"), 2);
        assert_eq!(transcript.rendered(), vec!["One. ", "One. Two. ", "One. Two. "]);
    }

    #[test]
    fn test_missing_policy_uses_configured_default() {
        let transcript = Transcript::new();
        let config = EngineConfig {
            default_end_policy: EndPolicy::NoRepeat,
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_config(config, transcript.clone());
        engine.register_tree("scene").unwrap();

        let outcomes = visit_n(&mut engine, &visitation(None), 3);
        assert_eq!(outcomes[2], VisitOutcome::Stopped);
    }

    #[test]
    fn test_unknown_tree_and_unvisitable_branch() {
        let (mut engine, _) = engine();

        let elsewhere = Visitation {
            tree_id: TreeId::new("elsewhere").unwrap(),
            ..visitation(None)
        };
        assert!(matches!(
            engine.visit(elsewhere),
            Err(NarrativeError::TreeNotFound(_))
        ));

        let mut empty = visitation(None);
        empty.leaves.truncate(1);
        assert!(matches!(
            engine.visit(empty),
            Err(NarrativeError::BranchNotFound { .. })
        ));
        assert_eq!(engine.cursor("scene", "intro"), 0);
    }

    #[test]
    fn test_malformed_argument_keeps_cursor() {
        let (mut engine, transcript) = engine();
        let mut v = visitation(None);
        engine.visit(v.clone()).unwrap();

        v.leaves[2].argument = "{sprite:".to_string();
        let err = engine.visit(v.clone()).unwrap_err();

        match err {
            NarrativeError::MalformedArgument { leaf, raw, .. } => {
                assert_eq!(leaf, 2);
                assert_eq!(raw, "{sprite:");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.cursor("scene", "intro"), 1);
        assert_eq!(transcript.render_count(), 1);

        v.leaves[2].argument = "{}".to_string();
        assert_eq!(engine.visit(v).unwrap().revealed_leaf(), Some(2));
    }

    #[test]
    fn test_failing_provider_keeps_cursor() {
        let (mut engine, _) = engine();
        engine
            .tree_mut("scene")
            .unwrap()
            .register_provider(
                "sprite",
                ProviderDefinition::new()
                    .on_update(|_, _, _| Err(ProviderError::new("missing image"))),
            )
            .unwrap();

        let mut v = visitation(None);
        v.leaves[1].argument = r#"{"sprite": "hero.png"}"#.to_string();

        let err = engine.visit(v).unwrap_err();
        assert!(matches!(err, NarrativeError::Provider { .. }));
        assert_eq!(engine.cursor("scene", "intro"), 0);
    }

    #[test]
    fn test_leaf_arguments_reach_providers() {
        let (mut engine, _) = engine();
        let seen: Rc<RefCell<Vec<Value>>> = Rc::default();
        let sink = seen.clone();
        engine
            .tree_mut("scene")
            .unwrap()
            .register_provider(
                "sprite",
                ProviderDefinition::new().skip_args(true).on_update(move |args, _, ctx| {
                    assert_eq!(ctx.current_leaf_index(), Some(1));
                    sink.borrow_mut().extend(args.iter().cloned());
                    Ok(())
                }),
            )
            .unwrap();

        let mut v = visitation(None);
        v.leaves[1].argument = r#"{"sprite": ["hero.png", "left"]}"#.to_string();
        engine.visit(v).unwrap();

        assert_eq!(*seen.borrow(), vec![json!(["hero.png", "left"])]);
    }

    #[test]
    fn test_pending_values_carry_to_later_leaves() {
        let (mut engine, _) = engine();
        let seen: Rc<RefCell<Vec<Value>>> = Rc::default();
        let sink = seen.clone();
        engine
            .tree_mut("scene")
            .unwrap()
            .register_provider(
                "sprite",
                ProviderDefinition::new().on_update(move |args, _, _| {
                    sink.borrow_mut().push(args[0].clone());
                    Ok(())
                }),
            )
            .unwrap();

        let mut v = visitation(Some(EndPolicy::Repeat));
        v.leaves[1].argument = r#"{"sprite": "hero.png"}"#.to_string();

        visit_n(&mut engine, &v, 2);
        assert_eq!(*seen.borrow(), vec![json!("hero.png"), json!("hero.png")]);
        assert_eq!(
            engine.state("scene").unwrap().pending_delta.get("sprite"),
            Some(&DeltaValue::Update(json!("hero.png")))
        );

        // Starting over drops pending values.
        v.leaves[1].argument = "{}".to_string();
        engine.visit(v).unwrap();
        assert_eq!(seen.borrow().len(), 2);
        assert!(engine.state("scene").unwrap().pending_delta.is_empty());
    }

    #[test]
    fn test_pending_values_disabled() {
        let config = EngineConfig {
            persist_pending_delta: false,
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_config(config, Transcript::new());
        engine.register_tree("scene").unwrap();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        engine
            .tree_mut("scene")
            .unwrap()
            .register_provider(
                "sprite",
                ProviderDefinition::new().on_update(move |_, _, _| {
                    *counter.borrow_mut() += 1;
                    Ok(())
                }),
            )
            .unwrap();

        let mut v = visitation(None);
        v.leaves[1].argument = r#"{"sprite": "hero.png"}"#.to_string();
        visit_n(&mut engine, &v, 2);

        assert_eq!(*calls.borrow(), 1);
        assert!(engine.state("scene").unwrap().pending_delta.is_empty());
    }

    #[test]
    fn test_cleared_pending_value_is_dropped() {
        let (mut engine, _) = engine();
        let clears = Rc::new(RefCell::new(0));
        let counter = clears.clone();
        engine
            .tree_mut("scene")
            .unwrap()
            .register_provider(
                "music",
                ProviderDefinition::new()
                    .on_update(|_, _, _| Ok(()))
                    .on_clear(move |_, _| {
                        *counter.borrow_mut() += 1;
                        Ok(())
                    }),
            )
            .unwrap();

        let mut v = visitation(None).with_leaf(Leaf::new("Three."));
        v.leaves[1].argument = r#"{"music": "theme.ogg"}"#.to_string();
        v.leaves[2].argument = r#"{"music": null}"#.to_string();
        visit_n(&mut engine, &v, 3);

        assert_eq!(*clears.borrow(), 1);
        assert!(!engine
            .state("scene")
            .unwrap()
            .pending_delta
            .contains_key("music"));
    }

    #[test]
    fn test_leaf_cannot_override_content_key() {
        let (mut engine, transcript) = engine();
        let mut v = visitation(None);
        v.leaves[1].argument = r#"{"default": "ignored"}"#.to_string();

        engine.visit(v).unwrap();

        let last_delta = engine
            .tree("scene")
            .unwrap()
            .provider("default")
            .unwrap()
            .last_delta()
            .cloned()
            .unwrap();
        assert_eq!(last_delta.get("default"), Some(&DeltaValue::Update(json!("One. "))));
        assert!(engine.state("scene").unwrap().pending_delta.is_empty());
        assert_eq!(transcript.last().as_deref(), Some("One. "));
    }

    #[test]
    fn test_detached_update() {
        let (mut engine, _) = engine();
        let clears = Rc::new(RefCell::new(0));
        let counter = clears.clone();
        engine
            .tree_mut("scene")
            .unwrap()
            .register_provider(
                ["left", "right"],
                ProviderDefinition::new()
                    .on_update(|_, _, _| Ok(()))
                    .on_clear(move |_, _| {
                        *counter.borrow_mut() += 1;
                        Ok(())
                    }),
            )
            .unwrap();

        engine
            .update("scene", &Delta::new().with_clear("left").with_clear("right"))
            .unwrap();

        assert_eq!(*clears.borrow(), 2);
        assert!(matches!(
            engine.update("missing", &Delta::new()),
            Err(NarrativeError::TreeNotFound(_))
        ));
    }

    #[test]
    fn test_register_tree_validation() {
        let (mut engine, _) = engine();
        assert!(matches!(
            engine.register_tree("  "),
            Err(NarrativeError::Validation(_))
        ));
        assert!(matches!(
            engine.register_tree("scene"),
            Err(NarrativeError::Validation(_))
        ));

        let blank_default = EngineConfig {
            default_provider_id: String::new(),
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_config(blank_default, Transcript::new());
        assert!(engine.register_tree("scene").is_err());
        assert!(engine.tree("scene").is_none());
    }

    #[test]
    fn test_delete_tree() {
        let (mut engine, _) = engine();
        engine.visit(visitation(None)).unwrap();

        assert!(engine.delete_tree("scene"));
        assert!(engine.tree("scene").is_none());
        assert!(engine.state("scene").is_none());
        assert!(!engine.delete_tree("scene"));
        assert!(!engine.delete_tree(""));
    }

    #[test]
    fn test_delete_tree_requires_both_entries() {
        let (mut engine, _) = engine();
        engine.states.remove(&TreeId::new("scene").unwrap());

        assert!(!engine.delete_tree("scene"));
        assert!(engine.tree("scene").is_some());
    }

    #[test]
    fn test_snapshot_and_restore() {
        let (mut engine, _) = engine();
        let mut v = visitation(None);
        v.leaves[1].argument = r#"{"sprite": "hero.png"}"#.to_string();
        engine.visit(v.clone()).unwrap();
        let saved = engine.snapshot().unwrap();

        engine.visit(v.clone()).unwrap();
        assert_eq!(engine.cursor("scene", "intro"), 2);

        engine.restore(&saved).unwrap();
        assert_eq!(engine.cursor("scene", "intro"), 1);
        assert!(engine
            .state("scene")
            .unwrap()
            .pending_delta
            .contains_key("sprite"));

        assert!(engine.restore("not json").is_err());
        assert_eq!(engine.cursor("scene", "intro"), 1);
    }

    #[test]
    fn test_restore_before_registration_keeps_progress() {
        let mut engine = Engine::new(Transcript::new());
        engine
            .restore(r#"{"scene":{"log":{"intro":1}}}"#)
            .unwrap();
        engine.register_tree("scene").unwrap();

        assert_eq!(engine.cursor("scene", "intro"), 1);
        assert_eq!(engine.visit(visitation(None)).unwrap().revealed_leaf(), Some(2));
    }

    #[test]
    fn test_restored_max_cursor_holds_last_leaf() {
        let (mut engine, transcript) = engine();
        engine
            .restore(r#"{"scene":{"log":{"intro":18446744073709551615}}}"#)
            .unwrap();

        let outcome = engine.visit(visitation(Some(EndPolicy::RepeatLast))).unwrap();

        assert_eq!(
            outcome,
            VisitOutcome::Revealed {
                leaf: 2,
                transition: Transition::Repeated,
            }
        );
        assert_eq!(engine.cursor("scene", "intro"), 2);
        assert_eq!(transcript.last().as_deref(), Some("One. Two. "));
    }

    #[test]
    fn test_reset_branch() {
        let (mut engine, _) = engine();
        visit_n(&mut engine, &visitation(None), 2);

        assert_eq!(engine.reset_branch("scene", "intro").unwrap(), 2);
        assert_eq!(engine.cursor("scene", "intro"), 0);
        assert!(matches!(
            engine.reset_branch("missing", "intro"),
            Err(NarrativeError::TreeNotFound(_))
        ));
    }

    #[test]
    fn test_deferred_visit_sees_persisted_cursor() {
        let (mut engine, _) = engine();
        let observed: Rc<RefCell<Vec<Option<usize>>>> = Rc::default();
        let sink = observed.clone();
        let follow_up = visitation(Some(EndPolicy::NoRepeat));
        engine
            .tree_mut("scene")
            .unwrap()
            .register_provider(
                "chain",
                ProviderDefinition::new().on_update(move |_, _, ctx| {
                    sink.borrow_mut().push(ctx.current_leaf_index());
                    ctx.defer(follow_up.clone());
                    Ok(())
                }),
            )
            .unwrap();

        let mut v = visitation(None);
        v.leaves[1].argument = r#"{"chain": true}"#.to_string();
        engine.visit(v).unwrap();

        // The deferred visit moved on to leaf 2. "chain" is a pending value there
        // too, so it deferred once more and that visit stopped at the end.
        assert_eq!(engine.cursor("scene", "intro"), 2);
        assert_eq!(observed.borrow()[0], Some(1));
        assert_eq!(observed.borrow()[1], Some(2));
        assert_eq!(observed.borrow().len(), 2);
    }

    #[test]
    fn test_run_directive_reports_errors() {
        let (mut engine, transcript) = engine();

        let mut bad = visitation(None);
        bad.leaves[1].argument = "[1]".to_string();
        assert!(engine.run_directive(bad).is_none());

        let reports = transcript.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("scene / intro"));
        assert!(reports[0].contains("leaf 1"));

        let stopped = visitation(Some(EndPolicy::NoRepeat));
        engine.run_directive(stopped.clone());
        engine.run_directive(stopped.clone());
        assert_eq!(engine.run_directive(stopped), Some(VisitOutcome::Stopped));
        assert_eq!(transcript.reports().len(), 1);
    }
}
