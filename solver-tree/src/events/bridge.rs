//! Event bridge: turns solver callbacks into a recorded search tree.

use std::time::Instant;

use super::{BranchOutcome, EventHandler, IterationInfo, SearchAction, SearchEvent};
use crate::error::{TreeError, TreeResult};
use crate::relaxation::{RelaxationSnapshot, RelaxationSolution};
use crate::search::{BranchDecision, FeasibilityStatus, NodeId, NodeMap};
use crate::settings::RecorderSettings;

/// Records a branch-and-bound search from the solver's events.
///
/// The bridge is the only writer of its [`NodeMap`]. Node lifecycle:
///
/// 1. created (by [`search_started`] for the root, by [`branch_decided`]
///    for children), with a relaxation snapshot attached;
/// 2. examined by the solver ([`node_examined`]);
/// 3. solved and finalized ([`node_solved`]);
/// 4. optionally branched, which creates both children at once.
///
/// Every event is then forwarded to the single handler `H`.
///
/// [`search_started`]: EventBridge::search_started
/// [`branch_decided`]: EventBridge::branch_decided
/// [`node_examined`]: EventBridge::node_examined
/// [`node_solved`]: EventBridge::node_solved
pub struct EventBridge<H: EventHandler = Box<dyn EventHandler>> {
    /// Recorded tree.
    map: NodeMap,

    /// Handler receiving every event.
    handler: H,

    /// Node whose relaxation the solver is currently solving.
    current: Option<NodeId>,

    /// Number of node_examined events.
    nodes_examined: u64,

    /// Start time.
    start_time: Option<Instant>,

    /// Settings.
    settings: RecorderSettings,
}

impl<H: EventHandler> EventBridge<H> {
    /// Create a bridge with an empty map.
    pub fn new(settings: RecorderSettings, handler: H) -> Self {
        Self {
            map: NodeMap::new(),
            handler,
            current: None,
            nodes_examined: 0,
            start_time: None,
            settings,
        }
    }

    /// Record the root node with the solver's initial relaxation.
    pub fn search_started(&mut self, mut root: RelaxationSnapshot) -> TreeResult<NodeId> {
        if !self.map.is_empty() {
            return Err(TreeError::invalid_state(0, "search already started"));
        }
        self.start_time = Some(Instant::now());

        if self.settings.standardize_rows {
            root.standardize();
        }
        let id = self.map.create_node(None, None)?;
        self.handler.on_search_started(&root);
        self.map.attach_snapshot(id, root)?;

        if self.settings.verbose {
            log::info!("Recording search with handler '{}'", self.handler.name());
        }
        Ok(id)
    }

    /// The solver starts solving node `id`.
    pub fn node_examined(&mut self, id: NodeId) -> TreeResult<SearchAction> {
        let node = self.map.node(id)?;
        if node.processed {
            return Err(TreeError::invalid_state(id, "node already processed"));
        }

        self.current = Some(id);
        self.nodes_examined += 1;
        log::debug!("Examining node {} (depth {})", id, node.depth());

        let action = self.handler.on_node_examined(node);
        self.log_progress();
        Ok(action)
    }

    /// Replace the relaxation of the node being solved.
    ///
    /// Used when the solver tightens a node's relaxation before solving it.
    pub fn update_relaxation(&mut self, id: NodeId, mut snapshot: RelaxationSnapshot) -> TreeResult<()> {
        let num_cols = self
            .map
            .root()
            .and_then(|root| root.snapshot())
            .map(|s| s.num_cols());
        if num_cols.is_some_and(|n| n != snapshot.num_cols()) {
            return Err(TreeError::InvalidSnapshot(format!(
                "node {} relaxation has {} columns, root has {}",
                id,
                snapshot.num_cols(),
                num_cols.unwrap_or_default()
            )));
        }

        if self.settings.standardize_rows {
            snapshot.standardize();
        }
        self.map.attach_snapshot(id, snapshot)
    }

    /// The solver finished node `id`; record the outcome and finalize.
    pub fn node_solved(
        &mut self,
        id: NodeId,
        solution: RelaxationSolution,
    ) -> TreeResult<FeasibilityStatus> {
        if self.current != Some(id) {
            return Err(TreeError::invalid_state(id, "node solved before it was examined"));
        }

        let status = if solution.primal_feasible {
            FeasibilityStatus::Feasible
        } else {
            FeasibilityStatus::Infeasible
        };
        self.map.record_solution(id, solution.clone())?;
        self.map.finalize(id, status)?;
        self.current = None;

        log::debug!("Node {} finalized as {:?}", id, status);
        self.handler.on_node_solved(self.map.node(id)?, &solution);
        Ok(status)
    }

    /// The solver branches node `parent` on `var` at `value`.
    ///
    /// Records the down child then the up child, each carrying the parent's
    /// relaxation with the branching bound applied. When the node budget has
    /// no room for both, nothing is recorded.
    pub fn branch_decided(&mut self, parent: NodeId, var: usize, value: f64) -> TreeResult<BranchOutcome> {
        let entry = self.map.get(parent)?;
        let node = entry.node();
        if !node.processed {
            return Err(TreeError::invalid_state(parent, "branching on an unprocessed node"));
        }
        if node.status != FeasibilityStatus::Feasible {
            return Err(TreeError::invalid_state(parent, "branching on an infeasible node"));
        }
        if !node.is_leaf || !node.children.is_empty() {
            return Err(TreeError::invalid_state(parent, "node already branched"));
        }
        if !value.is_finite() {
            return Err(TreeError::invalid_state(parent, format!("non-finite branching value {}", value)));
        }
        let snapshot = entry
            .snapshot()
            .ok_or_else(|| TreeError::invalid_state(parent, "no snapshot attached"))?;
        if var >= snapshot.num_cols() {
            return Err(TreeError::InvalidSnapshot(format!(
                "branching on column {} but only {} columns",
                var,
                snapshot.num_cols()
            )));
        }

        if !self.settings.has_room(self.map.size(), 2) {
            log::warn!(
                "Node budget exhausted at {} nodes; not branching node {}",
                self.map.size(),
                parent
            );
            return Ok(BranchOutcome::BudgetExhausted);
        }

        let (lb, ub) = (snapshot.col_lower()[var], snapshot.col_upper()[var]);
        let down_branch = BranchDecision::down(var, value);
        let up_branch = BranchDecision::up(var, value);
        let down_snapshot = snapshot.with_bound_change(&down_branch.bound_change(lb, ub))?;
        let up_snapshot = snapshot.with_bound_change(&up_branch.bound_change(lb, ub))?;

        let down = self.map.create_node(Some(parent), Some(down_branch))?;
        self.map.attach_snapshot(down, down_snapshot)?;
        let up = self.map.create_node(Some(parent), Some(up_branch))?;
        self.map.attach_snapshot(up, up_snapshot)?;

        log::debug!("Branched node {} on x{} = {}: down {}, up {}", parent, var, value, down, up);
        self.handler.on_branch(self.map.node(parent)?, down, up);
        Ok(BranchOutcome::Created { down, up })
    }

    /// The solver found a new incumbent.
    pub fn solution_found(&mut self, objective: f64, x: &[f64]) -> SearchAction {
        self.handler.on_solution_found(objective, x)
    }

    /// The solver finished a simplex iteration on the current node.
    pub fn iteration_completed(&mut self, mut info: IterationInfo) {
        info.node = self.current;
        self.handler.on_iteration_completed(&info);
    }

    /// Route an event to the matching method.
    ///
    /// A refused branch is reported as [`SearchAction::Stop`].
    pub fn dispatch(&mut self, event: SearchEvent) -> TreeResult<SearchAction> {
        match event {
            SearchEvent::NodeExamined(id) => self.node_examined(id),
            SearchEvent::BranchDecided { parent, var, value } => {
                match self.branch_decided(parent, var, value)? {
                    BranchOutcome::Created { .. } => Ok(SearchAction::Continue),
                    BranchOutcome::BudgetExhausted => Ok(SearchAction::Stop),
                }
            }
            SearchEvent::SolutionFound { objective, x } => Ok(self.solution_found(objective, &x)),
            SearchEvent::IterationCompleted(info) => {
                self.iteration_completed(info);
                Ok(SearchAction::Continue)
            }
        }
    }

    /// End the search and hand over the recorded tree.
    pub fn search_finished(mut self) -> NodeMap {
        let summary = self.map.summary();
        self.handler.on_search_finished(&summary);

        if self.settings.verbose {
            log::info!(
                "Recorded {} nodes ({} processed, {} open) in {:.1}s",
                summary.nodes,
                summary.processed,
                summary.unprocessed,
                self.elapsed_ms() as f64 / 1000.0,
            );
        }
        self.map
    }

    /// The tree recorded so far.
    pub fn map(&self) -> &NodeMap {
        &self.map
    }

    /// The handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Node currently being solved.
    pub fn current_node(&self) -> Option<NodeId> {
        self.current
    }

    /// Number of node_examined events so far.
    pub fn nodes_examined(&self) -> u64 {
        self.nodes_examined
    }

    /// Elapsed time since the search started (milliseconds).
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn log_progress(&self) {
        if !self.settings.verbose {
            return;
        }

        if self.nodes_examined % self.settings.log_freq.max(1) != 0 {
            return;
        }

        let summary = self.map.summary();
        log::info!(
            "Nodes: {} examined | {} recorded ({} open) | Depth: {} | Time: {:.1}s",
            self.nodes_examined,
            summary.nodes,
            summary.unprocessed,
            summary.max_depth,
            self.elapsed_ms() as f64 / 1000.0,
        );
    }
}
