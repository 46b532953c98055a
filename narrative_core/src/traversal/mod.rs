//! Branch traversal - which leaf a visitation reveals next.
//!
//! A branch moves through three states:
//!
//! 1. **Idle**: cursor 0, nothing revealed. Leaf 0 is the branch preamble.
//! 2. **Advancing**: every visit moves the cursor one leaf forward.
//! 3. **Terminal or looping**: the cursor sits on the last leaf and the end
//!    policy decides whether the next visit stops, repeats it, or starts over.

use narrative_state::{BranchId, EndPolicy, TreeId};
use serde::{Deserialize, Serialize};

/// Argument expression used for leaves that carry none.
pub const EMPTY_ARGUMENT: &str = "{}";

/// One authored chunk of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    /// Raw text revealed by this leaf.
    pub content: String,

    /// Raw argument expression, handed to the host evaluator.
    #[serde(default = "empty_argument")]
    pub argument: String,
}

fn empty_argument() -> String {
    EMPTY_ARGUMENT.to_string()
}

impl Leaf {
    /// A leaf with no argument payload.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            argument: empty_argument(),
        }
    }

    /// Set the argument expression.
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = argument.into();
        self
    }
}

/// A request to visit a branch, as produced by the directive front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitation {
    pub tree_id: TreeId,
    pub branch_id: BranchId,

    /// End policy for this branch. `None` uses the engine default.
    #[serde(default)]
    pub policy: Option<EndPolicy>,

    /// Leaf 0 is the preamble and is never revealed by a visit.
    pub leaves: Vec<Leaf>,
}

impl Visitation {
    pub fn new(tree_id: TreeId, branch_id: BranchId) -> Self {
        Self {
            tree_id,
            branch_id,
            policy: None,
            leaves: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: EndPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_leaf(mut self, leaf: Leaf) -> Self {
        self.leaves.push(leaf);
        self
    }

    pub fn with_leaves(mut self, leaves: impl IntoIterator<Item = Leaf>) -> Self {
        self.leaves.extend(leaves);
        self
    }

    /// A branch needs a preamble and at least one leaf to reveal.
    pub fn is_visitable(&self) -> bool {
        self.leaves.len() >= 2
    }
}

/// How the revealed leaf was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// The cursor moved one leaf forward.
    Advanced,
    /// The cursor was at the end and the last leaf is shown again.
    Repeated,
    /// The cursor was at the end and the branch started over at leaf 1.
    Restarted,
}

/// The traversal decision for one visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Reveal { leaf: usize, transition: Transition },
    Stop,
}

/// Result of a visitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitOutcome {
    /// A leaf was dispatched and the cursor now points at it.
    Revealed { leaf: usize, transition: Transition },
    /// The branch is exhausted under `no-repeat`; nothing happened.
    Stopped,
}

impl VisitOutcome {
    pub fn revealed_leaf(&self) -> Option<usize> {
        match self {
            VisitOutcome::Revealed { leaf, .. } => Some(*leaf),
            VisitOutcome::Stopped => None,
        }
    }
}

/// Decide the next leaf for a branch of `len` leaves whose cursor is `latest`.
///
/// `len` must be at least 2. A `latest` beyond the last leaf (content shortened
/// since the cursor was saved, or a corrupt save) is treated as the end of the
/// sequence.
pub fn next_step(latest: usize, len: usize, policy: EndPolicy) -> Step {
    if let Some(candidate) = latest.checked_add(1).filter(|&candidate| candidate < len) {
        return Step::Reveal {
            leaf: candidate,
            transition: Transition::Advanced,
        };
    }

    match policy {
        EndPolicy::NoRepeat => Step::Stop,
        EndPolicy::RepeatLast => Step::Reveal {
            leaf: latest.min(len - 1),
            transition: Transition::Repeated,
        },
        EndPolicy::Repeat => Step::Reveal {
            leaf: 1,
            transition: Transition::Restarted,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(policy: EndPolicy, len: usize, visits: usize) -> Vec<Step> {
        let mut cursor = 0;
        let mut steps = Vec::new();
        for _ in 0..visits {
            let step = next_step(cursor, len, policy);
            if let Step::Reveal { leaf, .. } = step {
                cursor = leaf;
            }
            steps.push(step);
        }
        steps
    }

    fn advanced(leaf: usize) -> Step {
        Step::Reveal {
            leaf,
            transition: Transition::Advanced,
        }
    }

    #[test]
    fn test_no_repeat_stops_at_end() {
        let steps = walk(EndPolicy::NoRepeat, 3, 4);
        assert_eq!(steps, vec![advanced(1), advanced(2), Step::Stop, Step::Stop]);
    }

    #[test]
    fn test_repeat_restarts_at_leaf_one() {
        let steps = walk(EndPolicy::Repeat, 3, 4);
        assert_eq!(
            steps[2],
            Step::Reveal {
                leaf: 1,
                transition: Transition::Restarted,
            }
        );
        assert_eq!(steps[3], advanced(2));
    }

    #[test]
    fn test_repeat_last_holds_final_leaf() {
        let steps = walk(EndPolicy::RepeatLast, 3, 4);
        let repeated = Step::Reveal {
            leaf: 2,
            transition: Transition::Repeated,
        };
        assert_eq!(steps, vec![advanced(1), advanced(2), repeated, repeated]);
    }

    #[test]
    fn test_stale_cursor_past_end() {
        assert_eq!(
            next_step(7, 3, EndPolicy::RepeatLast),
            Step::Reveal {
                leaf: 2,
                transition: Transition::Repeated,
            }
        );
        assert_eq!(next_step(7, 3, EndPolicy::NoRepeat), Step::Stop);
    }

    #[test]
    fn test_max_cursor_is_end_of_sequence() {
        assert_eq!(
            next_step(usize::MAX, 3, EndPolicy::RepeatLast),
            Step::Reveal {
                leaf: 2,
                transition: Transition::Repeated,
            }
        );
        assert_eq!(next_step(usize::MAX, 3, EndPolicy::NoRepeat), Step::Stop);
        assert_eq!(
            next_step(usize::MAX, 3, EndPolicy::Repeat),
            Step::Reveal {
                leaf: 1,
                transition: Transition::Restarted,
            }
        );
    }

    #[test]
    fn test_leaf_default_argument() {
        let leaf = Leaf::new("Hello");
        assert_eq!(leaf.argument, "{}");

        let decoded: Leaf = serde_json::from_str(r#"{"content":"Hi"}"#).unwrap();
        assert_eq!(decoded.argument, "{}");
    }

    #[test]
    fn test_visitable_needs_two_leaves() {
        let tree = TreeId::new("scene").unwrap();
        let branch = BranchId::new("intro").unwrap();

        let empty = Visitation::new(tree.clone(), branch.clone());
        assert!(!empty.is_visitable());

        let preamble_only = empty.clone().with_leaf(Leaf::new(""));
        assert!(!preamble_only.is_visitable());

        let visitable = preamble_only.with_leaf(Leaf::new("One."));
        assert!(visitable.is_visitable());
    }
}
