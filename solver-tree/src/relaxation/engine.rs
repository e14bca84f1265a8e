//! Relaxation engine trait and the replay engine.

use super::{RelaxationSnapshot, RelaxationSolution};
use crate::error::{TreeError, TreeResult};

/// Access to the external solver's relaxation capabilities.
///
/// The recorder never solves anything itself. The checker uses an engine to
/// re-derive the relaxation of every node it inspects, so implementations
/// must be idempotent: solving the same snapshot twice yields the same
/// feasibility and objective value, and nothing beyond primal/dual values
/// may change.
pub trait RelaxationEngine {
    /// Name used in logs and violation details.
    fn name(&self) -> &str;

    /// Solve the relaxation described by `snapshot`.
    fn solve_relaxation(&mut self, snapshot: &RelaxationSnapshot) -> TreeResult<RelaxationSolution>;

    /// Column bounds as seen by the engine.
    fn column_bounds<'a>(&self, snapshot: &'a RelaxationSnapshot) -> (&'a [f64], &'a [f64]) {
        (snapshot.col_lower(), snapshot.col_upper())
    }

    /// Row bounds as seen by the engine.
    fn row_bounds<'a>(&self, snapshot: &'a RelaxationSnapshot) -> (&'a [f64], &'a [f64]) {
        (snapshot.row_lower(), snapshot.row_upper())
    }
}

/// Engine that returns the solution already stored in each snapshot.
///
/// Lets a recorded tree be checked after the solver that produced it is
/// gone. Unsolved snapshots yield [`TreeError::NotSolved`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayEngine;

impl RelaxationEngine for ReplayEngine {
    fn name(&self) -> &str {
        "replay"
    }

    fn solve_relaxation(&mut self, snapshot: &RelaxationSnapshot) -> TreeResult<RelaxationSolution> {
        snapshot.solution().cloned().ok_or(TreeError::NotSolved)
    }
}
