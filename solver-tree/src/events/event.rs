//! Search events delivered by the external solver.

use crate::search::NodeId;

/// What the solver should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchAction {
    /// Carry on searching.
    #[default]
    Continue,

    /// Stop the search; the tree recorded so far stays valid.
    Stop,
}

impl SearchAction {
    /// True for [`SearchAction::Stop`].
    pub fn is_stop(self) -> bool {
        self == SearchAction::Stop
    }
}

/// Outcome of a branching request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchOutcome {
    /// Both children were recorded, down first.
    Created {
        /// Down child (x <= floor(value)).
        down: NodeId,
        /// Up child (x >= ceil(value)).
        up: NodeId,
    },

    /// The node budget leaves no room for two children; nothing was recorded.
    BudgetExhausted,
}

/// Dual values after one simplex iteration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IterationInfo {
    /// Iteration counter reported by the solver.
    pub iteration: u64,

    /// Node being solved (filled in by the bridge).
    pub node: Option<NodeId>,

    /// Row dual values.
    pub row_duals: Vec<f64>,

    /// Column reduced costs.
    pub column_duals: Vec<f64>,
}

impl IterationInfo {
    /// Create iteration info for the node currently being solved.
    pub fn new(iteration: u64, row_duals: Vec<f64>, column_duals: Vec<f64>) -> Self {
        Self {
            iteration,
            node: None,
            row_duals,
            column_duals,
        }
    }
}

/// Events a solver can deliver through [`EventBridge::dispatch`].
///
/// [`EventBridge::dispatch`]: super::EventBridge::dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// The solver starts solving the relaxation of a recorded node.
    NodeExamined(NodeId),

    /// The solver branches on `var` at `value` below `parent`.
    BranchDecided {
        /// Processed node being branched.
        parent: NodeId,
        /// Branching variable.
        var: usize,
        /// Fractional value of `var` in the parent's relaxation.
        value: f64,
    },

    /// A new incumbent was found.
    SolutionFound {
        /// Objective value.
        objective: f64,
        /// Primal solution.
        x: Vec<f64>,
    },

    /// A simplex iteration finished.
    IterationCompleted(IterationInfo),
}
