//! Search node representation.

/// Identifier of a recorded node; the root is `0`.
pub type NodeId = u64;

/// Feasibility classification of a node's relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeasibilityStatus {
    /// Relaxation not solved yet.
    #[default]
    Unknown,

    /// Relaxation is primal feasible.
    Feasible,

    /// Relaxation is infeasible (node pruned on infeasibility).
    Infeasible,
}

/// Direction of a branch relative to the branching value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BranchWay {
    /// x <= floor(value).
    Down = -1,

    /// x >= ceil(value).
    Up = 1,
}

impl BranchWay {
    /// The other direction.
    pub fn opposite(self) -> Self {
        match self {
            BranchWay::Down => BranchWay::Up,
            BranchWay::Up => BranchWay::Down,
        }
    }
}

/// The branching decision that created a node from its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BranchDecision {
    /// Variable branched on.
    pub var: usize,

    /// Parent's (fractional) value of `var`.
    pub value: f64,

    /// Which side of `value` this node covers.
    pub way: BranchWay,
}

impl BranchDecision {
    /// Create a down decision.
    pub fn down(var: usize, value: f64) -> Self {
        Self {
            var,
            value,
            way: BranchWay::Down,
        }
    }

    /// Create an up decision.
    pub fn up(var: usize, value: f64) -> Self {
        Self {
            var,
            value,
            way: BranchWay::Up,
        }
    }

    /// The bound change this decision applies to bounds `[old_lb, old_ub]`.
    pub fn bound_change(&self, old_lb: f64, old_ub: f64) -> BoundChange {
        match self.way {
            BranchWay::Down => BoundChange::down_branch(self.var, old_lb, old_ub, self.value),
            BranchWay::Up => BoundChange::up_branch(self.var, old_lb, old_ub, self.value),
        }
    }

    /// Whether a column value lies on this decision's side of `value`.
    pub fn is_enforced_by(&self, x: f64, tol: f64) -> bool {
        match self.way {
            BranchWay::Down => x <= self.value.floor() + tol,
            BranchWay::Up => x >= self.value.ceil() - tol,
        }
    }
}

/// A bound change from branching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundChange {
    /// Variable index.
    pub var: usize,

    /// Previous lower bound.
    pub old_lb: f64,

    /// Previous upper bound.
    pub old_ub: f64,

    /// New lower bound.
    pub new_lb: f64,

    /// New upper bound.
    pub new_ub: f64,
}

impl BoundChange {
    /// Create a "down" branch: x <= floor(value).
    pub fn down_branch(var: usize, old_lb: f64, old_ub: f64, value: f64) -> Self {
        Self {
            var,
            old_lb,
            old_ub,
            new_lb: old_lb,
            new_ub: value.floor().min(old_ub),
        }
    }

    /// Create an "up" branch: x >= ceil(value).
    pub fn up_branch(var: usize, old_lb: f64, old_ub: f64, value: f64) -> Self {
        Self {
            var,
            old_lb,
            old_ub,
            new_lb: value.ceil().max(old_lb),
            new_ub: old_ub,
        }
    }
}

/// A node in the recorded B&B tree.
///
/// `children` and `lineage` are plain id lists into the node map; the map
/// owns every node.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Unique node identifier, assigned in creation order.
    pub id: NodeId,

    /// Ancestor chain from the root to this node, inclusive.
    pub lineage: Vec<NodeId>,

    /// True until the node has been branched (both children exist).
    pub is_leaf: bool,

    /// Children created by branching on this node.
    pub children: Vec<NodeId>,

    /// Feasibility of the node's relaxation.
    pub status: FeasibilityStatus,

    /// True once the relaxation has been solved and classified.
    pub processed: bool,

    /// Decision that created this node (None for root).
    pub branch: Option<BranchDecision>,

    /// Column bound change applied by `branch`.
    pub bound_change: Option<BoundChange>,
}

impl SearchNode {
    /// Create the root node.
    pub fn root() -> Self {
        Self {
            id: 0,
            lineage: vec![0],
            is_leaf: true,
            children: Vec::new(),
            status: FeasibilityStatus::Unknown,
            processed: false,
            branch: None,
            bound_change: None,
        }
    }

    /// Create a child node from a branching decision.
    pub fn child(&self, id: NodeId, branch: BranchDecision) -> Self {
        let mut lineage = Vec::with_capacity(self.lineage.len() + 1);
        lineage.extend_from_slice(&self.lineage);
        lineage.push(id);

        Self {
            id,
            lineage,
            is_leaf: true,
            children: Vec::new(),
            status: FeasibilityStatus::Unknown,
            processed: false,
            branch: Some(branch),
            bound_change: None,
        }
    }

    /// Depth in the tree (0 for root).
    pub fn depth(&self) -> usize {
        self.lineage.len().saturating_sub(1)
    }

    /// Parent node ID (None for root).
    pub fn parent_id(&self) -> Option<NodeId> {
        let n = self.lineage.len();
        if n >= 2 {
            Some(self.lineage[n - 2])
        } else {
            None
        }
    }

    /// True for the root node.
    pub fn is_root(&self) -> bool {
        self.id == 0
    }

    /// Variable this node was branched on by its parent.
    pub fn branch_variable(&self) -> Option<usize> {
        self.branch.map(|b| b.var)
    }

    /// Value the parent's branching variable had.
    pub fn branch_value(&self) -> Option<f64> {
        self.branch.map(|b| b.value)
    }

    /// Direction of the branch that created this node.
    pub fn branch_way(&self) -> Option<BranchWay> {
        self.branch.map(|b| b.way)
    }
}
