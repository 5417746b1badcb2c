//! Solvers for the course tasks.
//!
//! Every solver follows fetch, reason, submit. Batch question tasks wrap the
//! reason and submit steps in an [`AttemptLoop`] that feeds grading feedback
//! back into the next round.

pub mod attempt;
pub mod executor;
pub mod graph;
pub mod reasoner;
pub mod tasks;

pub use attempt::*;
pub use executor::*;
pub use graph::*;
pub use reasoner::*;
pub use tasks::*;
