//! Solver event handling.
//!
//! The [`EventBridge`] records the search tree as the solver reports events
//! and forwards every event to one [`EventHandler`].

mod bridge;
mod duals;
mod event;
mod handler;
mod incumbent;

pub use bridge::EventBridge;
pub use duals::RootDualsHandler;
pub use event::{BranchOutcome, IterationInfo, SearchAction, SearchEvent};
pub use handler::{EventHandler, LogHandler, NoOpHandler, NodeLimitHandler};
pub use incumbent::IncumbentHandler;
