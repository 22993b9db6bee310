//! Resource kinds: named categories of protocol-governed handles.
//!
//! A kind fixes the state space, the initial state, the terminal states a
//! session may legitimately end in, and optionally the operation used to
//! clean up after an early exit and the states in which an instance may be
//! handed to a new owner. Kinds are built with
//! [`KindBuilder`](crate::builder::KindBuilder) and are immutable afterwards.

mod space;

pub use space::StateSpace;

use crate::checker::{BoxError, ProtocolError};
use crate::core::{Guard, Outcome, State};
use std::fmt;
use std::sync::Arc;

/// Action run by the session runner when a body exits early.
pub type CleanupAction<O> = Arc<dyn Fn() -> Result<O, BoxError> + Send + Sync>;

/// Designated cleanup operation of a kind.
#[derive(Clone)]
pub struct Cleanup<O: Outcome> {
    pub operation: String,
    pub action: CleanupAction<O>,
}

impl<O: Outcome> fmt::Debug for Cleanup<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

/// A declared resource kind.
#[derive(Clone, Debug)]
pub struct ResourceKind<S: State, O: Outcome> {
    pub(crate) name: String,
    pub(crate) initial: S,
    pub(crate) terminal: Vec<S>,
    pub(crate) terminal_when: Option<Guard<S>>,
    pub(crate) space: StateSpace<S>,
    pub(crate) cleanup: Option<Cleanup<O>>,
    pub(crate) handoff: Option<Guard<S>>,
}

impl<S: State + 'static, O: Outcome + 'static> ResourceKind<S, O> {
    /// Start building a kind with the given name.
    pub fn builder(name: impl Into<String>) -> crate::builder::KindBuilder<S, O> {
        crate::builder::KindBuilder::new(name)
    }
}

impl<S: State, O: Outcome> ResourceKind<S, O> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial(&self) -> &S {
        &self.initial
    }

    pub fn terminal_states(&self) -> &[S] {
        &self.terminal
    }

    pub fn space(&self) -> &StateSpace<S> {
        &self.space
    }

    pub fn cleanup(&self) -> Option<&Cleanup<O>> {
        self.cleanup.as_ref()
    }

    /// Whether a session may end in `state`: either a listed terminal
    /// state or one accepted by the terminal predicate of an indexed family.
    pub fn is_terminal(&self, state: &S) -> bool {
        self.terminal.contains(state)
            || self.terminal_when.as_ref().is_some_and(|g| g.check(state))
    }

    /// Whether `state` belongs to the declared space.
    pub fn contains(&self, state: &S) -> bool {
        self.space.contains(state)
    }

    /// Whether an instance in `state` may change owner. Kinds without a
    /// handoff predicate allow it everywhere.
    pub fn can_hand_off(&self, state: &S) -> bool {
        self.handoff.as_ref().is_none_or(|g| g.check(state))
    }

    /// Check that the initial and terminal states lie in the space.
    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        for state in std::iter::once(&self.initial).chain(self.terminal.iter()) {
            if !self.space.contains(state) {
                return Err(ProtocolError::StateOutsideSpace {
                    kind: self.name.clone(),
                    state: format!("{state:?}"),
                });
            }
        }
        Ok(())
    }
}
