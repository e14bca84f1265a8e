//! Invariant violations and the check report.

use std::fmt;

use crate::error::{TreeError, TreeResult};
use crate::search::{NodeId, TreeSummary};

/// Which tree invariant a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViolationKind {
    /// Stored id differs from the node's position in the map.
    IdMismatch,

    /// Lineage does not start at the root, end at the node, or extend the
    /// parent's lineage.
    Lineage,

    /// A child id that is not in the map.
    DanglingChild,

    /// Leaf flag disagrees with the number of children.
    ChildCount,

    /// Exactly one child: the node was left half-branched.
    PartialBranch,

    /// Root with a branching decision, or non-root without one.
    BranchRecord,

    /// Siblings disagree on variable or value, or branch the same way.
    SiblingMismatch,

    /// First child is not the down branch.
    SiblingOrder,

    /// A child's column bounds, or the bounds of a row it shares with its
    /// parent, are looser than the parent's.
    BoundsNotRefined,

    /// A feasible child has a better objective than its feasible parent.
    ObjectiveDecreased,

    /// Feasibility status disagrees with processed flag or relaxation.
    StatusMismatch,

    /// Re-solving a processed node contradicts its recorded feasibility or
    /// objective.
    ResolveMismatch,

    /// The relaxation of an unprocessed node violates its branching decision.
    BranchNotEnforced,

    /// Node has no relaxation snapshot.
    MissingSnapshot,

    /// The relaxation engine failed while re-solving a node.
    EngineFailure,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One failed invariant check.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Violation {
    /// Node the violation is reported on.
    pub node_id: NodeId,

    /// Invariant broken.
    pub kind: ViolationKind,

    /// Human-readable diagnostic.
    pub detail: String,
}

impl Violation {
    /// Create a violation.
    pub fn new(node_id: NodeId, kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            node_id,
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}: {}: {}", self.node_id, self.kind, self.detail)
    }
}

/// Result of checking a whole tree.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckReport {
    /// All violations, in node id order.
    pub violations: Vec<Violation>,

    /// Number of nodes inspected.
    pub nodes_checked: usize,

    /// Counts over the inspected tree.
    pub summary: TreeSummary,
}

impl CheckReport {
    /// True if no invariant is violated.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Count violations of one kind.
    pub fn count_by_kind(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    /// Violations reported on one node.
    pub fn for_node(&self, id: NodeId) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.node_id == id)
    }

    /// Turn a failed report into [`TreeError::InvariantViolation`].
    pub fn into_result(self) -> TreeResult<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(TreeError::InvariantViolation(self.violations.len()))
        }
    }
}
