//! Event handler interface and the basic handlers.
//!
//! A handler reacts to solver events without touching the node map; the
//! bridge owns the map and calls exactly one handler, chosen when the bridge
//! is built. Every callback has a no-op default, so a handler only overrides
//! the events it cares about.

use super::{IterationInfo, SearchAction};
use crate::relaxation::{RelaxationSnapshot, RelaxationSolution};
use crate::search::{NodeId, SearchNode, TreeSummary};

/// Pluggable reaction to solver events.
pub trait EventHandler {
    /// Name of the handler.
    fn name(&self) -> &str;

    /// Called once the root relaxation has been captured.
    fn on_search_started(&mut self, _root: &RelaxationSnapshot) {}

    /// Called when the solver starts solving a node's relaxation.
    fn on_node_examined(&mut self, _node: &SearchNode) -> SearchAction {
        SearchAction::Continue
    }

    /// Called after a node was finalized.
    fn on_node_solved(&mut self, _node: &SearchNode, _solution: &RelaxationSolution) {}

    /// Called after both children of `parent` were recorded.
    fn on_branch(&mut self, _parent: &SearchNode, _down: NodeId, _up: NodeId) {}

    /// Called when the solver reports a new incumbent.
    fn on_solution_found(&mut self, _objective: f64, _x: &[f64]) -> SearchAction {
        SearchAction::Continue
    }

    /// Called after every simplex iteration the solver reports.
    fn on_iteration_completed(&mut self, _info: &IterationInfo) {}

    /// Called once when the search is over.
    fn on_search_finished(&mut self, _summary: &TreeSummary) {}
}

impl<H: EventHandler + ?Sized> EventHandler for Box<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_search_started(&mut self, root: &RelaxationSnapshot) {
        (**self).on_search_started(root)
    }

    fn on_node_examined(&mut self, node: &SearchNode) -> SearchAction {
        (**self).on_node_examined(node)
    }

    fn on_node_solved(&mut self, node: &SearchNode, solution: &RelaxationSolution) {
        (**self).on_node_solved(node, solution)
    }

    fn on_branch(&mut self, parent: &SearchNode, down: NodeId, up: NodeId) {
        (**self).on_branch(parent, down, up)
    }

    fn on_solution_found(&mut self, objective: f64, x: &[f64]) -> SearchAction {
        (**self).on_solution_found(objective, x)
    }

    fn on_iteration_completed(&mut self, info: &IterationInfo) {
        (**self).on_iteration_completed(info)
    }

    fn on_search_finished(&mut self, summary: &TreeSummary) {
        (**self).on_search_finished(summary)
    }
}

impl std::fmt::Debug for dyn EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventHandler({})", self.name())
    }
}

/// Handler that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHandler;

impl EventHandler for NoOpHandler {
    fn name(&self) -> &str {
        "no-op"
    }
}

/// Handler that logs node and solution events.
#[derive(Debug, Clone, Default)]
pub struct LogHandler {
    nodes_examined: u64,
    solutions_found: u64,
}

impl LogHandler {
    /// Create a log handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes seen so far.
    pub fn nodes_examined(&self) -> u64 {
        self.nodes_examined
    }

    /// Solutions seen so far.
    pub fn solutions_found(&self) -> u64 {
        self.solutions_found
    }
}

impl EventHandler for LogHandler {
    fn name(&self) -> &str {
        "log"
    }

    fn on_node_examined(&mut self, node: &SearchNode) -> SearchAction {
        self.nodes_examined += 1;
        log::info!("Examining node {} at depth {}", node.id, node.depth());
        SearchAction::Continue
    }

    fn on_node_solved(&mut self, node: &SearchNode, solution: &RelaxationSolution) {
        match solution.objective_value {
            Some(obj) => log::info!("Node {} solved: obj={:.6e}", node.id, obj),
            None => log::info!("Node {} pruned on infeasibility", node.id),
        }
    }

    fn on_solution_found(&mut self, objective: f64, _x: &[f64]) -> SearchAction {
        self.solutions_found += 1;
        log::info!("Solution found during branch and bound: obj={:.6e}", objective);
        SearchAction::Continue
    }

    fn on_search_finished(&mut self, summary: &TreeSummary) {
        log::info!(
            "Search finished: {} nodes ({} processed, {} feasible, {} infeasible, {} open)",
            summary.nodes,
            summary.processed,
            summary.feasible,
            summary.infeasible,
            summary.unprocessed,
        );
    }
}

/// Handler that asks the solver to stop after a number of examined nodes.
#[derive(Debug, Clone)]
pub struct NodeLimitHandler {
    max_nodes: u64,
    examined: u64,
}

impl NodeLimitHandler {
    /// Stop once `max_nodes` nodes have been examined.
    pub fn new(max_nodes: u64) -> Self {
        Self {
            max_nodes,
            examined: 0,
        }
    }

    /// Nodes examined so far.
    pub fn examined(&self) -> u64 {
        self.examined
    }
}

impl EventHandler for NodeLimitHandler {
    fn name(&self) -> &str {
        "node-limit"
    }

    fn on_node_examined(&mut self, _node: &SearchNode) -> SearchAction {
        self.examined += 1;
        if self.examined >= self.max_nodes {
            SearchAction::Stop
        } else {
            SearchAction::Continue
        }
    }
}
