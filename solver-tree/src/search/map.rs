//! Append-only store of every node created during a search.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{BranchDecision, FeasibilityStatus, NodeId, SearchNode};
use crate::error::{TreeError, TreeResult};
use crate::relaxation::{RelaxationSnapshot, RelaxationSolution};

/// One recorded node together with its relaxation.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    /// Node metadata.
    pub node: SearchNode,

    /// Relaxation snapshot (None until attached).
    pub snapshot: Option<RelaxationSnapshot>,
}

impl NodeEntry {
    /// Node metadata.
    pub fn node(&self) -> &SearchNode {
        &self.node
    }

    /// Relaxation snapshot, if attached.
    pub fn snapshot(&self) -> Option<&RelaxationSnapshot> {
        self.snapshot.as_ref()
    }
}

/// Node map: node id -> (search node, relaxation snapshot).
///
/// Ids are dense and equal to the insertion index. Entries are never
/// removed, and once a node is processed its snapshot and status are frozen.
/// The only later change to a processed node is the arrival of its
/// children.
#[derive(Debug, Clone, Default)]
pub struct NodeMap {
    entries: Vec<NodeEntry>,
}

impl NodeMap {
    /// Create an empty node map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes recorded so far.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// True if no node was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Allocate the next node.
    ///
    /// Without a parent this creates the root, which is only allowed on an
    /// empty map. With a parent, `branch` is required; the new id is appended
    /// to the parent's children and the parent stops being a leaf when its
    /// second child arrives.
    pub fn create_node(
        &mut self,
        parent: Option<NodeId>,
        branch: Option<BranchDecision>,
    ) -> TreeResult<NodeId> {
        let id = self.entries.len() as NodeId;

        let node = match parent {
            None => {
                if !self.entries.is_empty() {
                    return Err(TreeError::invalid_state(id, "root already recorded"));
                }
                if branch.is_some() {
                    return Err(TreeError::invalid_state(id, "root cannot carry a branching decision"));
                }
                SearchNode::root()
            }
            Some(parent_id) => {
                let branch = branch.ok_or_else(|| {
                    TreeError::invalid_state(id, "non-root node needs a branching decision")
                })?;
                let parent_entry = self.entry_mut(parent_id)?;
                if parent_entry.node.children.len() >= 2 {
                    return Err(TreeError::invalid_state(
                        parent_id,
                        "node already has two children",
                    ));
                }

                let mut child = parent_entry.node.child(id, branch);
                child.bound_change = parent_entry.snapshot.as_ref().and_then(|s| {
                    let (lb, ub) = (s.col_lower().get(branch.var)?, s.col_upper().get(branch.var)?);
                    Some(branch.bound_change(*lb, *ub))
                });

                parent_entry.node.children.push(id);
                if parent_entry.node.children.len() == 2 {
                    parent_entry.node.is_leaf = false;
                }
                child
            }
        };

        log::debug!("Recorded node {} (lineage {:?})", id, node.lineage);
        self.entries.push(NodeEntry {
            node,
            snapshot: None,
        });
        Ok(id)
    }

    /// Store or replace the relaxation of an unprocessed node.
    pub fn attach_snapshot(&mut self, id: NodeId, snapshot: RelaxationSnapshot) -> TreeResult<()> {
        let entry = self.unprocessed_mut(id)?;
        entry.snapshot = Some(snapshot);
        Ok(())
    }

    /// Store the solved state of an unprocessed node's relaxation.
    pub fn record_solution(&mut self, id: NodeId, solution: RelaxationSolution) -> TreeResult<()> {
        let entry = self.unprocessed_mut(id)?;
        let snapshot = entry
            .snapshot
            .as_mut()
            .ok_or_else(|| TreeError::invalid_state(id, "no snapshot attached"))?;
        snapshot.set_solution(solution)
    }

    /// Mark a node processed with its terminal feasibility status.
    pub fn finalize(&mut self, id: NodeId, status: FeasibilityStatus) -> TreeResult<()> {
        if status == FeasibilityStatus::Unknown {
            return Err(TreeError::invalid_state(id, "cannot finalize with Unknown status"));
        }
        let entry = self.unprocessed_mut(id)?;
        if entry.snapshot.is_none() {
            return Err(TreeError::invalid_state(id, "no snapshot attached"));
        }

        entry.node.processed = true;
        entry.node.status = status;
        Ok(())
    }

    /// Look up a node and its relaxation.
    pub fn get(&self, id: NodeId) -> TreeResult<&NodeEntry> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.entries.get(i))
            .ok_or(TreeError::NotFound(id))
    }

    /// Look up a node's metadata.
    pub fn node(&self, id: NodeId) -> TreeResult<&SearchNode> {
        self.get(id).map(|e| &e.node)
    }

    /// The root entry, if recorded.
    pub fn root(&self) -> Option<&NodeEntry> {
        self.entries.first()
    }

    /// Children recorded for a node.
    pub fn children_of(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        self.get(id).map(|e| e.node.children.as_slice())
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeEntry> {
        self.entries.iter()
    }

    /// Aggregate counts over the recorded tree.
    pub fn summary(&self) -> TreeSummary {
        let mut summary = TreeSummary {
            nodes: self.entries.len(),
            ..Default::default()
        };

        for entry in &self.entries {
            let node = &entry.node;
            if node.processed {
                summary.processed += 1;
            } else {
                summary.unprocessed += 1;
            }
            match node.status {
                FeasibilityStatus::Feasible => summary.feasible += 1,
                FeasibilityStatus::Infeasible => summary.infeasible += 1,
                FeasibilityStatus::Unknown => {}
            }
            if node.is_leaf {
                summary.leaves += 1;
            } else {
                summary.branched += 1;
            }
            summary.max_depth = summary.max_depth.max(node.depth());
        }

        summary
    }

    #[cfg(test)]
    pub(crate) fn entries_mut(&mut self) -> &mut Vec<NodeEntry> {
        &mut self.entries
    }

    fn entry_mut(&mut self, id: NodeId) -> TreeResult<&mut NodeEntry> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.entries.get_mut(i))
            .ok_or(TreeError::NotFound(id))
    }

    fn unprocessed_mut(&mut self, id: NodeId) -> TreeResult<&mut NodeEntry> {
        let entry = self.entry_mut(id)?;
        if entry.node.processed {
            return Err(TreeError::invalid_state(id, "node already processed"));
        }
        Ok(entry)
    }
}

impl<'a> IntoIterator for &'a NodeMap {
    type Item = &'a NodeEntry;
    type IntoIter = std::slice::Iter<'a, NodeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Counts over a recorded tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeSummary {
    /// Recorded nodes.
    pub nodes: usize,
    /// Nodes finalized with a terminal status.
    pub processed: usize,
    /// Nodes created but never finalized.
    pub unprocessed: usize,
    /// Processed nodes with a feasible relaxation.
    pub feasible: usize,
    /// Processed nodes pruned on infeasibility.
    pub infeasible: usize,
    /// Nodes with two children.
    pub branched: usize,
    /// Nodes without children.
    pub leaves: usize,
    /// Largest lineage length minus one.
    pub max_depth: usize,
}

/// Node map behind a single lock, for solvers that record from several
/// threads.
///
/// Each operation takes the lock for exactly its own duration. Ids are
/// still assigned in lock-acquisition order, so the map stays dense.
#[derive(Debug, Clone, Default)]
pub struct SharedNodeMap {
    inner: Arc<Mutex<NodeMap>>,
}

impl SharedNodeMap {
    /// Create an empty shared map.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`NodeMap::create_node`].
    pub fn create_node(
        &self,
        parent: Option<NodeId>,
        branch: Option<BranchDecision>,
    ) -> TreeResult<NodeId> {
        self.inner.lock().create_node(parent, branch)
    }

    /// See [`NodeMap::attach_snapshot`].
    pub fn attach_snapshot(&self, id: NodeId, snapshot: RelaxationSnapshot) -> TreeResult<()> {
        self.inner.lock().attach_snapshot(id, snapshot)
    }

    /// See [`NodeMap::record_solution`].
    pub fn record_solution(&self, id: NodeId, solution: RelaxationSolution) -> TreeResult<()> {
        self.inner.lock().record_solution(id, solution)
    }

    /// See [`NodeMap::finalize`].
    pub fn finalize(&self, id: NodeId, status: FeasibilityStatus) -> TreeResult<()> {
        self.inner.lock().finalize(id, status)
    }

    /// Number of nodes recorded so far.
    pub fn size(&self) -> usize {
        self.inner.lock().size()
    }

    /// Run a read-only closure against the map.
    pub fn read<R>(&self, f: impl FnOnce(&NodeMap) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Take the map out once every other handle is dropped, otherwise clone it.
    pub fn into_inner(self) -> NodeMap {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().clone(),
        }
    }
}
