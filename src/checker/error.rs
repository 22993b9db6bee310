//! Protocol errors.

use crate::registry::TransitionGap;
use thiserror::Error;
use uuid::Uuid;

/// Boxed error returned by an operation's action.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while declaring protocols or invoking operations.
///
/// States and outcomes are carried in their `Debug` rendering so the error
/// type does not depend on the protocol's state type.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Resource kind '{kind}' is already declared")]
    DuplicateKind { kind: String },

    #[error("Resource kind '{kind}' is not declared")]
    UnknownKind { kind: String },

    #[error("Operation '{operation}' is already registered for kind '{kind}'")]
    DuplicateOperation { kind: String, operation: String },

    #[error(
        "Operation '{operation}' of kind '{kind}' leaves {} transition(s) undefined",
        .gaps.len()
    )]
    IncompleteTransition {
        kind: String,
        operation: String,
        gaps: Vec<TransitionGap>,
    },

    #[error("State {state} is outside the state space of kind '{kind}'")]
    StateOutsideSpace { kind: String, state: String },

    #[error("Operation '{operation}' is not registered for kind '{kind}'")]
    UnknownOperation { kind: String, operation: String },

    #[error("Precondition of '{operation}' does not hold in state {state}")]
    PreconditionViolation { operation: String, state: String },

    #[error("Action of '{operation}' failed: {source}")]
    ActionFailed {
        operation: String,
        #[source]
        source: BoxError,
    },

    #[error("Operation '{operation}' produced undeclared outcome {outcome}")]
    UndeclaredOutcome { operation: String, outcome: String },

    #[error("Operation '{operation}' has no transition from {state} on outcome {outcome}")]
    TransitionUndefined {
        operation: String,
        state: String,
        outcome: String,
    },

    #[error("Resource instance {id} of kind '{kind}' is retired")]
    InstanceRetired { kind: String, id: Uuid },
}

impl ProtocolError {
    /// Whether a caller can reasonably continue after this error.
    ///
    /// Declaration mistakes and internal-invariant breaches are fatal;
    /// everything surfaced by a single invocation is recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnknownOperation { .. }
                | ProtocolError::PreconditionViolation { .. }
                | ProtocolError::ActionFailed { .. }
                | ProtocolError::UndeclaredOutcome { .. }
        )
    }

    /// Whether the protocol was followed but the underlying action failed.
    pub fn is_action_failure(&self) -> bool {
        matches!(self, ProtocolError::ActionFailed { .. })
    }

    pub(crate) fn action_failed(operation: &str, source: impl Into<BoxError>) -> Self {
        ProtocolError::ActionFailed {
            operation: operation.to_string(),
            source: source.into(),
        }
    }
}
