//! Builder API for declaring kinds and operations.
//!
//! This module provides fluent builders and the `state_enum!` macro so that
//! protocols can be declared with little boilerplate.

pub mod error;
pub mod kind;
pub mod macros;
pub mod operation;

pub use error::BuildError;
pub use kind::KindBuilder;
pub use operation::OperationBuilder;

use crate::core::{Outcome, State};
use crate::registry::Operation;

/// Create an operation with a single outcome that always moves to `to`,
/// invocable wherever `guard` holds.
///
/// # Example
///
/// ```
/// use tenet::builder::fixed_operation;
/// use tenet::state_enum;
///
/// state_enum! {
///     enum Handle {
///         Closed,
///         Open,
///     }
/// }
///
/// let close = fixed_operation("close", |h: &Handle| *h != Handle::Closed, (), Handle::Closed)
///     .unwrap();
///
/// assert!(close.allows(&Handle::Open));
/// assert_eq!(close.next_state(&Handle::Open, &()), Some(Handle::Closed));
/// ```
pub fn fixed_operation<S, O, F>(
    name: impl Into<String>,
    guard: F,
    outcome: O,
    to: S,
) -> Result<Operation<S, O>, BuildError>
where
    S: State + 'static,
    O: Outcome + 'static,
    F: Fn(&S) -> bool + Send + Sync + 'static,
{
    OperationBuilder::new(name)
        .when(guard)
        .outcome(outcome)
        .moves_to(to)
        .build()
}
