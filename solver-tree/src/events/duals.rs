//! Root-node dual capture.

use super::{EventHandler, IterationInfo};

/// Keeps the duals of the last simplex iteration at the root node.
///
/// Iterations reported while any other node is being solved are ignored.
#[derive(Debug, Clone, Default)]
pub struct RootDualsHandler {
    last: Option<IterationInfo>,
    root_iterations: u64,
}

impl RootDualsHandler {
    /// Create an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Row duals of the last root iteration.
    pub fn row_duals(&self) -> Option<&[f64]> {
        self.last.as_ref().map(|i| i.row_duals.as_slice())
    }

    /// Reduced costs of the last root iteration.
    pub fn column_duals(&self) -> Option<&[f64]> {
        self.last.as_ref().map(|i| i.column_duals.as_slice())
    }

    /// Number of iterations seen at the root.
    pub fn root_iterations(&self) -> u64 {
        self.root_iterations
    }
}

impl EventHandler for RootDualsHandler {
    fn name(&self) -> &str {
        "root-duals"
    }

    fn on_iteration_completed(&mut self, info: &IterationInfo) {
        if info.node != Some(0) {
            return;
        }
        self.root_iterations += 1;
        self.last = Some(info.clone());
    }
}
