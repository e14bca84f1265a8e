//! Incumbent tracking from solution events.

use super::{EventHandler, SearchAction};

/// Keeps the best solution reported during the search (minimization).
#[derive(Debug, Clone)]
pub struct IncumbentHandler {
    /// Current best solution (if any).
    pub solution: Option<Vec<f64>>,

    /// Objective value of the incumbent.
    /// Initialized to +inf.
    pub objective: f64,

    /// Number of times the incumbent improved.
    pub update_count: u64,

    /// Ask the solver to stop once the incumbent reaches this value.
    target: Option<f64>,
}

impl Default for IncumbentHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl IncumbentHandler {
    /// Create a handler with no incumbent.
    pub fn new() -> Self {
        Self {
            solution: None,
            objective: f64::INFINITY,
            update_count: 0,
            target: None,
        }
    }

    /// Stop the search once an incumbent with objective `<= target` is found.
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    /// Check if we have an incumbent.
    pub fn has_incumbent(&self) -> bool {
        self.solution.is_some()
    }

    /// Try to update the incumbent; true if it improved.
    pub fn update(&mut self, x: &[f64], objective: f64) -> bool {
        // strictly better only
        if objective < self.objective - 1e-9 {
            self.solution = Some(x.to_vec());
            self.objective = objective;
            self.update_count += 1;
            true
        } else {
            false
        }
    }

    fn target_reached(&self) -> bool {
        matches!(self.target, Some(t) if self.has_incumbent() && self.objective <= t)
    }
}

impl EventHandler for IncumbentHandler {
    fn name(&self) -> &str {
        "incumbent"
    }

    fn on_solution_found(&mut self, objective: f64, x: &[f64]) -> SearchAction {
        if self.update(x, objective) {
            log::debug!("New incumbent: obj={:.6e}", objective);
        }
        if self.target_reached() {
            SearchAction::Stop
        } else {
            SearchAction::Continue
        }
    }
}
