//! Tree invariant checker.
//!
//! Walks a recorded [`NodeMap`] in id order and collects every violation of
//! the branch-and-bound laws instead of stopping at the first one:
//!
//! 1. ids are dense and equal to the map position
//! 2. a child's lineage is its parent's lineage plus the child id
//! 3. a leaf has no children, a branched node exactly two
//! 4. siblings share variable and value and branch opposite ways, down first
//! 5. a child's column bounds, and the bounds of the rows it shares with its
//!    parent, refine the parent's
//! 6. a feasible child's objective is no better than its feasible parent's
//! 7. `Feasible`/`Infeasible` match a processed, solved relaxation; `Unknown`
//!    means unprocessed; re-solving a processed node reproduces its recorded
//!    feasibility and objective
//! 8. an unprocessed non-root node's relaxation, if feasible, respects its
//!    branching decision
//!
//! Checks (5) through (8) see relaxations through a [`RelaxationEngine`]:
//! bounds as the engine reports them, and at most one re-solve per node.

use std::collections::HashMap;

use super::{CheckReport, Violation, ViolationKind};
use crate::error::TreeError;
use crate::relaxation::{loosened_bounds, RelaxationEngine, RelaxationSnapshot, RelaxationSolution};
use crate::search::{BranchWay, FeasibilityStatus, NodeEntry, NodeId, NodeMap};
use crate::settings::CheckSettings;

/// Checks recorded trees against the branch-and-bound invariants.
pub struct TreeChecker<E> {
    engine: E,
    settings: CheckSettings,
}

impl<E: RelaxationEngine> TreeChecker<E> {
    /// Create a checker with default tolerances.
    pub fn new(engine: E) -> Self {
        Self::with_settings(engine, CheckSettings::default())
    }

    /// Create a checker with explicit tolerances.
    pub fn with_settings(engine: E, settings: CheckSettings) -> Self {
        Self { engine, settings }
    }

    /// The engine used for re-solves.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Check every node; an empty result means the tree is consistent.
    pub fn check(&mut self, map: &NodeMap) -> Vec<Violation> {
        let mut pass = CheckPass {
            engine: &mut self.engine,
            settings: &self.settings,
            map,
            resolved: HashMap::new(),
            violations: Vec::new(),
        };

        for (index, entry) in map.iter().enumerate() {
            pass.check_node(index, entry);
        }

        pass.violations
    }

    /// Check every node and summarize the tree.
    pub fn report(&mut self, map: &NodeMap) -> CheckReport {
        let violations = self.check(map);
        let report = CheckReport {
            violations,
            nodes_checked: map.size(),
            summary: map.summary(),
        };

        if report.passed() {
            log::info!("Tree of {} nodes passed all invariant checks", report.nodes_checked);
        } else {
            log::warn!(
                "Tree of {} nodes has {} invariant violation(s)",
                report.nodes_checked,
                report.violations.len()
            );
        }
        report
    }
}

/// State for one walk over a map.
struct CheckPass<'a, E> {
    engine: &'a mut E,
    settings: &'a CheckSettings,
    map: &'a NodeMap,
    /// Re-solved relaxations by node; None if the engine failed.
    resolved: HashMap<NodeId, Option<RelaxationSolution>>,
    violations: Vec<Violation>,
}

impl<'a, E: RelaxationEngine> CheckPass<'a, E> {
    fn report(&mut self, node_id: NodeId, kind: ViolationKind, detail: String) {
        log::debug!("Invariant violation at node {}: {:?}: {}", node_id, kind, detail);
        self.violations.push(Violation::new(node_id, kind, detail));
    }

    fn check_node(&mut self, index: usize, entry: &'a NodeEntry) {
        let node = &entry.node;
        let id = node.id;

        // (1) dense ids
        if id != index as NodeId {
            self.report(
                id,
                ViolationKind::IdMismatch,
                format!("stored at position {index}"),
            );
        }

        // Lineage must start at the root and end at the node.
        if node.lineage.first() != Some(&0) || node.lineage.last() != Some(&id) {
            self.report(
                id,
                ViolationKind::Lineage,
                format!("lineage {:?} does not run from root to node", node.lineage),
            );
        }

        match (node.is_root(), node.branch.is_some()) {
            (true, true) => self.report(
                id,
                ViolationKind::BranchRecord,
                "root carries a branching decision".to_string(),
            ),
            (false, false) => self.report(
                id,
                ViolationKind::BranchRecord,
                "non-root node has no branching decision".to_string(),
            ),
            _ => {}
        }

        if entry.snapshot.is_none() {
            self.report(id, ViolationKind::MissingSnapshot, "no relaxation attached".to_string());
        }

        // (3) leaf flag vs children
        match (node.is_leaf, node.children.len()) {
            (true, 0) | (false, 2) => {}
            (_, 1) => self.report(
                id,
                ViolationKind::PartialBranch,
                format!("only child {} was created", node.children[0]),
            ),
            (is_leaf, count) => self.report(
                id,
                ViolationKind::ChildCount,
                format!("is_leaf={is_leaf} with {count} children"),
            ),
        }

        let mut children: Vec<&'a NodeEntry> = Vec::with_capacity(node.children.len());
        for &child_id in &node.children {
            match self.map.get(child_id) {
                Ok(child) => children.push(child),
                Err(_) => self.report(
                    id,
                    ViolationKind::DanglingChild,
                    format!("child {child_id} is not recorded"),
                ),
            }
        }

        // (2), (5), (6) per child
        for child in &children {
            self.check_lineage(entry, child);
            self.check_refinement(entry, child);
            self.check_objective(entry, child);
        }

        // (4) siblings
        if let [first, second] = children.as_slice() {
            self.check_siblings(id, first, second);
        }

        // (7) status, then the engine's view of it
        self.check_status(entry);
        if node.processed && node.status != FeasibilityStatus::Unknown {
            self.check_resolved(entry);
        }

        // (8) unprocessed non-root nodes
        if !node.processed && !node.is_root() {
            self.check_branch_enforced(entry);
        }
    }

    fn check_lineage(&mut self, parent: &NodeEntry, child: &NodeEntry) {
        let expected_len = parent.node.lineage.len() + 1;
        let ok = child.node.lineage.len() == expected_len
            && child.node.lineage[..expected_len - 1] == parent.node.lineage[..]
            && child.node.lineage[expected_len - 1] == child.node.id;

        if !ok {
            self.report(
                child.node.id,
                ViolationKind::Lineage,
                format!(
                    "lineage {:?} does not extend parent lineage {:?}",
                    child.node.lineage, parent.node.lineage
                ),
            );
        }
    }

    fn check_siblings(&mut self, parent_id: NodeId, first: &NodeEntry, second: &NodeEntry) {
        let (Some(a), Some(b)) = (first.node.branch, second.node.branch) else {
            // Missing decisions are already reported per node.
            return;
        };

        if a.var != b.var || a.value != b.value || a.way != b.way.opposite() {
            self.report(
                parent_id,
                ViolationKind::SiblingMismatch,
                format!(
                    "children {} and {} branch as {:?} and {:?}",
                    first.node.id, second.node.id, a, b
                ),
            );
        } else if a.way != BranchWay::Down {
            self.report(
                parent_id,
                ViolationKind::SiblingOrder,
                format!("first child {} is the up branch", first.node.id),
            );
        }
    }

    fn check_refinement(&mut self, parent: &NodeEntry, child: &NodeEntry) {
        let (Some(parent_snap), Some(child_snap)) = (parent.snapshot(), child.snapshot()) else {
            return;
        };
        let child_id = child.node.id;
        let tol = self.settings.bound_tol;

        let child_cols = self.engine.column_bounds(child_snap);
        let parent_cols = self.engine.column_bounds(parent_snap);
        if child_cols.0.len() != parent_cols.0.len() {
            self.report(
                child_id,
                ViolationKind::BoundsNotRefined,
                format!(
                    "child has {} columns, parent {}",
                    child_cols.0.len(),
                    parent_cols.0.len()
                ),
            );
            return;
        }

        let loosened = loosened_bounds(child_cols, parent_cols, tol);
        if !loosened.is_empty() {
            self.report(
                child_id,
                ViolationKind::BoundsNotRefined,
                format!(
                    "bounds of columns {:?} are looser than in parent {}",
                    loosened, parent.node.id
                ),
            );
        }

        // Rows may only be appended below the parent's.
        let child_rows = self.engine.row_bounds(child_snap);
        let parent_rows = self.engine.row_bounds(parent_snap);
        if child_rows.0.len() < parent_rows.0.len() {
            return;
        }
        let loosened = loosened_bounds(child_rows, parent_rows, tol);
        if !loosened.is_empty() {
            self.report(
                child_id,
                ViolationKind::BoundsNotRefined,
                format!(
                    "bounds of rows {:?} are looser than in parent {}",
                    loosened, parent.node.id
                ),
            );
        }
    }

    fn check_objective(&mut self, parent: &NodeEntry, child: &NodeEntry) {
        if parent.node.status != FeasibilityStatus::Feasible
            || child.node.status != FeasibilityStatus::Feasible
        {
            return;
        }

        let parent_obj = self.resolve(parent).and_then(|s| s.objective_value);
        let child_obj = self.resolve(child).and_then(|s| s.objective_value);
        let (Some(parent_obj), Some(child_obj)) = (parent_obj, child_obj) else {
            return;
        };

        let tol = self.settings.obj_tol * parent_obj.abs().max(1.0);
        if child_obj < parent_obj - tol {
            self.report(
                child.node.id,
                ViolationKind::ObjectiveDecreased,
                format!(
                    "objective {child_obj} is better than parent {} objective {parent_obj}",
                    parent.node.id
                ),
            );
        }
    }

    fn check_status(&mut self, entry: &NodeEntry) {
        let node = &entry.node;
        let solved = entry.snapshot().is_some_and(RelaxationSnapshot::is_solved);
        let primal_feasible = entry.snapshot().is_some_and(RelaxationSnapshot::primal_feasible);

        let problem = match node.status {
            FeasibilityStatus::Feasible if !node.processed => Some("Feasible but not processed"),
            FeasibilityStatus::Feasible if !primal_feasible => {
                Some("Feasible but relaxation is not primal feasible")
            }
            FeasibilityStatus::Infeasible if !node.processed => {
                Some("Infeasible but not processed")
            }
            FeasibilityStatus::Infeasible if solved && primal_feasible => {
                Some("Infeasible but relaxation is primal feasible")
            }
            FeasibilityStatus::Infeasible if !solved => Some("Infeasible but relaxation unsolved"),
            FeasibilityStatus::Unknown if node.processed => Some("processed with Unknown status"),
            _ => None,
        };

        if let Some(problem) = problem {
            self.report(node.id, ViolationKind::StatusMismatch, problem.to_string());
        }
    }

    /// Compare a re-solve of a processed node with what was recorded.
    fn check_resolved(&mut self, entry: &NodeEntry) {
        let Some(solution) = self.resolve(entry) else {
            return;
        };
        let node = &entry.node;
        let stored = entry.snapshot().and_then(RelaxationSnapshot::solution);

        // A stored solution is what the status was derived from; status
        // disagreements with it are reported by check_status.
        let recorded_feasible = match stored {
            Some(stored) => stored.primal_feasible,
            None => node.status == FeasibilityStatus::Feasible,
        };
        let name = self.engine.name().to_string();

        if solution.primal_feasible != recorded_feasible {
            let found = if solution.primal_feasible { "feasible" } else { "infeasible" };
            self.report(
                node.id,
                ViolationKind::ResolveMismatch,
                format!("{name} engine finds the {:?} relaxation {found}", node.status),
            );
            return;
        }

        let recorded_obj = stored.and_then(|s| s.objective_value);
        if let (Some(recorded), Some(found)) = (recorded_obj, solution.objective_value) {
            let tol = self.settings.obj_tol * recorded.abs().max(1.0);
            if (found - recorded).abs() > tol {
                self.report(
                    node.id,
                    ViolationKind::ResolveMismatch,
                    format!("{name} engine objective {found} differs from recorded {recorded}"),
                );
            }
        }
    }

    fn check_branch_enforced(&mut self, entry: &NodeEntry) {
        let Some(decision) = entry.node.branch else {
            return;
        };
        // Nothing to verify without column values.
        let Some(solution) = self.resolve(entry) else {
            return;
        };
        if !solution.primal_feasible {
            return;
        }

        match solution.column_values.get(decision.var) {
            Some(&x) if decision.is_enforced_by(x, self.settings.feas_tol) => {}
            Some(&x) => self.report(
                entry.node.id,
                ViolationKind::BranchNotEnforced,
                format!(
                    "x{} = {x} is on the wrong side of {} for the {:?} branch",
                    decision.var, decision.value, decision.way
                ),
            ),
            None => self.report(
                entry.node.id,
                ViolationKind::EngineFailure,
                format!("engine returned no value for column {}", decision.var),
            ),
        }
    }

    /// Re-solve a node once per pass.
    ///
    /// `NotSolved` from the engine means there is nothing to compare against
    /// and yields None silently; other errors are reported once.
    fn resolve(&mut self, entry: &NodeEntry) -> Option<RelaxationSolution> {
        let id = entry.node.id;
        if let Some(cached) = self.resolved.get(&id) {
            return cached.clone();
        }

        let result = match entry.snapshot() {
            Some(snapshot) => match self.engine.solve_relaxation(snapshot) {
                Ok(solution) => Some(solution),
                Err(TreeError::NotSolved) => None,
                Err(err) => {
                    let name = self.engine.name().to_string();
                    self.report(
                        id,
                        ViolationKind::EngineFailure,
                        format!("{name} engine: {err}"),
                    );
                    None
                }
            },
            None => None,
        };

        self.resolved.insert(id, result.clone());
        result
    }
}
