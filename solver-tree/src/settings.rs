//! Configuration settings for recording and checking search trees.

/// Settings for the [`EventBridge`](crate::events::EventBridge).
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    // === Capture ===
    /// Rewrite captured relaxations into `>=`-form rows.
    ///
    /// Each ranged row `lo <= a^T x <= hi` becomes `-a^T x >= -hi` followed by
    /// `a^T x >= lo`, keeping only the finite sides.
    pub standardize_rows: bool,

    // === Termination ===
    /// Maximum number of nodes to record (None = unlimited).
    ///
    /// A branch that would push the map past this size is refused as a whole,
    /// so a node never ends up with a single child. The root is always
    /// recorded: a limit below 1 acts as 1.
    pub max_nodes: Option<u64>,

    // === Output ===
    /// Log progress information.
    pub verbose: bool,

    /// Log frequency (log every N examined nodes).
    pub log_freq: u64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            standardize_rows: true,
            max_nodes: None,
            verbose: false,
            log_freq: 100,
        }
    }
}

impl RecorderSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            log_freq: 1,
            ..Self::default()
        }
    }

    /// Set maximum recorded nodes, at least 1 for the root.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = Some(nodes.max(1));
        self
    }

    /// Keep captured relaxations exactly as the solver hands them over.
    pub fn without_standardization(mut self) -> Self {
        self.standardize_rows = false;
        self
    }

    /// True if a map of `size` nodes can take `extra` more.
    pub(crate) fn has_room(&self, size: usize, extra: usize) -> bool {
        match self.max_nodes {
            Some(limit) => (size + extra) as u64 <= limit.max(1),
            None => true,
        }
    }
}

/// Tolerances used by the [`TreeChecker`](crate::check::TreeChecker).
#[derive(Debug, Clone)]
pub struct CheckSettings {
    /// Slack allowed when comparing parent and child column bounds.
    pub bound_tol: f64,

    /// Slack allowed when comparing parent and child objective values.
    /// Scaled by `max(1, |parent objective|)`.
    pub obj_tol: f64,

    /// Slack allowed when checking that a branched column respects its
    /// branching decision.
    pub feas_tol: f64,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            bound_tol: 0.0,
            obj_tol: 1e-9,
            feas_tol: 1e-6,
        }
    }
}

impl CheckSettings {
    /// Set objective comparison tolerance.
    pub fn with_obj_tol(mut self, tol: f64) -> Self {
        self.obj_tol = tol;
        self
    }

    /// Set branching enforcement tolerance.
    pub fn with_feas_tol(mut self, tol: f64) -> Self {
        self.feas_tol = tol;
        self
    }
}
