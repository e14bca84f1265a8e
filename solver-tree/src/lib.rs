//! Branch-and-bound search-tree recorder for MIP solvers.
//!
//! This crate records the tree an external LP-based branch-and-bound solver
//! explores and verifies it afterwards:
//!
//! - [`relaxation`]: captured LP relaxations and the engine used to re-solve them
//! - [`search`]: search nodes and the node map that owns them
//! - [`events`]: the bridge that turns solver events into recorded nodes
//! - [`check`]: structural and numerical invariants of a recorded tree
//!
//! # Example
//!
//! ```
//! use solver_tree::check::TreeChecker;
//! use solver_tree::events::{EventBridge, NoOpHandler};
//! use solver_tree::relaxation::{RelaxationSnapshot, RelaxationSolution, ReplayEngine};
//! use solver_tree::settings::RecorderSettings;
//! use sprs::CsMat;
//!
//! // minimize -x0 s.t. x0 <= 1.5, 0 <= x0 <= 10
//! let a = CsMat::new_csc((1, 1), vec![0, 1], vec![0], vec![1.0]);
//! let root = RelaxationSnapshot::new(a, vec![-1.0], vec![0.0], vec![10.0], vec![f64::NEG_INFINITY], vec![1.5])?;
//!
//! let mut bridge = EventBridge::new(RecorderSettings::default(), NoOpHandler);
//! let id = bridge.search_started(root)?;
//! bridge.node_examined(id)?;
//! bridge.node_solved(id, RelaxationSolution::feasible(-1.5, vec![1.5]))?;
//! let map = bridge.search_finished();
//!
//! let report = TreeChecker::new(ReplayEngine).report(&map);
//! assert!(report.passed());
//! # Ok::<(), solver_tree::TreeError>(())
//! ```

#![warn(missing_docs)]

pub mod check;
pub mod error;
pub mod events;
pub mod relaxation;
pub mod search;
pub mod settings;

pub use check::{CheckReport, TreeChecker, Violation, ViolationKind};
pub use error::{TreeError, TreeResult};
pub use events::{EventBridge, EventHandler, SearchAction};
pub use relaxation::{RelaxationEngine, RelaxationSnapshot, RelaxationSolution};
pub use search::{NodeId, NodeMap, SearchNode};
pub use settings::{CheckSettings, RecorderSettings};
