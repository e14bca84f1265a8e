//! Verification of recorded search trees.

mod checker;
mod violation;

pub use checker::TreeChecker;
pub use violation::{CheckReport, Violation, ViolationKind};
