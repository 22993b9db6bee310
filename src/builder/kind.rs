//! Builder for resource kinds.

use crate::builder::error::BuildError;
use crate::checker::BoxError;
use crate::core::{Guard, Outcome, State};
use crate::kind::{Cleanup, ResourceKind, StateSpace};
use std::sync::Arc;

/// Builder for constructing resource kinds with a fluent API.
pub struct KindBuilder<S: State, O: Outcome> {
    name: String,
    initial: Option<S>,
    terminal: Vec<S>,
    terminal_when: Option<Guard<S>>,
    space: Option<StateSpace<S>>,
    cleanup: Option<Cleanup<O>>,
    handoff: Option<Guard<S>>,
}

impl<S: State + 'static, O: Outcome + 'static> KindBuilder<S, O> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial: None,
            terminal: Vec::new(),
            terminal_when: None,
            space: None,
            cleanup: None,
            handoff: None,
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Add terminal states (at least one required).
    pub fn terminal<I>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        for state in states {
            if !self.terminal.contains(&state) {
                self.terminal.push(state);
            }
        }
        self
    }

    /// Accept every state satisfying `predicate` as terminal. Used for
    /// indexed families such as "sealed at any length".
    pub fn terminal_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.terminal_when = Some(Guard::new(predicate));
        self
    }

    /// Set the state space (required).
    pub fn space(mut self, space: StateSpace<S>) -> Self {
        self.space = Some(space);
        self
    }

    /// Declare a cleanup operation whose action always yields `outcome`.
    pub fn cleanup(self, operation: impl Into<String>, outcome: O) -> Self {
        self.cleanup_with(operation, move || Ok(outcome.clone()))
    }

    /// Declare a cleanup operation with an effectful action.
    pub fn cleanup_with<F>(mut self, operation: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> Result<O, BoxError> + Send + Sync + 'static,
    {
        self.cleanup = Some(Cleanup {
            operation: operation.into(),
            action: Arc::new(action),
        });
        self
    }

    /// Restrict ownership handoff to states satisfying `predicate`.
    pub fn hand_off_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.handoff = Some(Guard::new(predicate));
        self
    }

    /// Build the kind.
    ///
    /// Space membership of the initial and terminal states is checked when
    /// the kind is declared on a registry.
    pub fn build(self) -> Result<ResourceKind<S, O>, BuildError> {
        if self.name.trim().is_empty() {
            return Err(BuildError::EmptyName);
        }
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        if self.terminal.is_empty() && self.terminal_when.is_none() {
            return Err(BuildError::NoTerminalStates);
        }
        let space = self.space.ok_or(BuildError::MissingStateSpace)?;

        Ok(ResourceKind {
            name: self.name,
            initial,
            terminal: self.terminal,
            terminal_when: self.terminal_when,
            space,
            cleanup: self.cleanup,
            handoff: self.handoff,
        })
    }
}
