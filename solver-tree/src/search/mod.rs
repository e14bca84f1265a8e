//! Branch-and-bound search tree records.

mod map;
mod node;

pub use map::{NodeEntry, NodeMap, SharedNodeMap, TreeSummary};
pub use node::{BoundChange, BranchDecision, BranchWay, FeasibilityStatus, NodeId, SearchNode};
