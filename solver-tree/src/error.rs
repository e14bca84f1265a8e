//! Error types for the search-tree recorder.

use thiserror::Error;

use crate::search::NodeId;

/// Errors raised by the node map, the event bridge and relaxation engines.
///
/// `InvalidState` and `NotFound` signal a broken integration between the
/// solver and the recorder and are not meant to be recovered from within a
/// single search. Invariant violations found by the checker are returned as
/// data instead; `InvariantViolation` only appears when a caller asks a
/// [`CheckReport`](crate::check::CheckReport) to be turned into a result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// Operation attempted on a node in the wrong lifecycle phase.
    #[error("Invalid state for node {node}: {reason}")]
    InvalidState {
        /// Node the operation targeted.
        node: NodeId,
        /// What was wrong.
        reason: String,
    },

    /// Node id outside the dense range of recorded nodes.
    #[error("Node {0} not found")]
    NotFound(NodeId),

    /// Relaxation data with inconsistent dimensions.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A snapshot was asked for a solution it never received.
    #[error("Relaxation has not been solved")]
    NotSolved,

    /// The relaxation engine failed.
    #[error("Relaxation engine failed: {0}")]
    Engine(String),

    /// The checker reported this many violations.
    #[error("Search tree has {0} invariant violation(s)")]
    InvariantViolation(usize),
}

impl TreeError {
    /// Shorthand for [`TreeError::InvalidState`].
    pub fn invalid_state(node: NodeId, reason: impl Into<String>) -> Self {
        TreeError::InvalidState {
            node,
            reason: reason.into(),
        }
    }
}

/// Result type for recorder operations.
pub type TreeResult<T> = Result<T, TreeError>;
