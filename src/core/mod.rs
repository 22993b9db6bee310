//! Core protocol types.
//!
//! This module contains the pure part of the tracker:
//! - States and outcomes via the `State` and `Outcome` traits
//! - Guard predicates used as operation preconditions
//! - The session log of committed transitions
//!
//! Nothing in this module performs I/O or holds locks.

mod guard;
mod history;
mod state;

pub use guard::Guard;
pub use history::{SessionLog, SessionStep};
pub use state::{Outcome, State};
