//! Relaxation snapshots and the engine interface used to re-solve them.

mod engine;
mod snapshot;

pub use engine::{RelaxationEngine, ReplayEngine};
pub use snapshot::{loosened_bounds, RelaxationSnapshot, RelaxationSolution, SparseCsc};
