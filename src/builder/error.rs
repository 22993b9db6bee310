//! Build errors for kind and operation builders.

use thiserror::Error;

/// Errors that can occur when building kinds and operations.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("No terminal states declared. Call .terminal(states) or .terminal_when(predicate)")]
    NoTerminalStates,

    #[error("State space not specified. Call .space(StateSpace::finite(..)) or .space(StateSpace::indexed(..))")]
    MissingStateSpace,

    #[error("Operation '{0}' declares no outcomes. Call .outcomes(values)")]
    EmptyOutcomeSpace(String),

    #[error("Operation '{0}' has no postcondition. Call .next(fn)")]
    MissingPostcondition(String),
}
