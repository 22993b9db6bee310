//! Builder for protocol operations.

use crate::builder::error::BuildError;
use crate::core::{Guard, Outcome, State};
use crate::registry::{NextFn, Operation};
use std::sync::Arc;

/// Builder for constructing operations with a fluent API.
pub struct OperationBuilder<S: State, O: Outcome> {
    name: String,
    precondition: Option<Guard<S>>,
    outcomes: Vec<O>,
    next: Option<NextFn<S, O>>,
}

impl<S: State + 'static, O: Outcome + 'static> OperationBuilder<S, O> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            precondition: None,
            outcomes: Vec::new(),
            next: None,
        }
    }

    /// Set the precondition guard. Without one the operation is invocable
    /// in every state.
    pub fn guard(mut self, guard: Guard<S>) -> Self {
        self.precondition = Some(guard);
        self
    }

    /// Set the precondition using a closure.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.precondition = Some(Guard::new(predicate));
        self
    }

    /// Add values to the outcome space (at least one required).
    pub fn outcomes<I>(mut self, outcomes: I) -> Self
    where
        I: IntoIterator<Item = O>,
    {
        for outcome in outcomes {
            if !self.outcomes.contains(&outcome) {
                self.outcomes.push(outcome);
            }
        }
        self
    }

    /// Add a single value to the outcome space.
    pub fn outcome(self, outcome: O) -> Self {
        self.outcomes([outcome])
    }

    /// Set the postcondition function (required).
    pub fn next<F>(mut self, next: F) -> Self
    where
        F: Fn(&S, &O) -> Option<S> + Send + Sync + 'static,
    {
        self.next = Some(Arc::new(next));
        self
    }

    /// Postcondition that ignores the entry state and outcome.
    pub fn moves_to(self, state: S) -> Self {
        self.next(move |_, _| Some(state.clone()))
    }

    /// Build the operation.
    pub fn build(self) -> Result<Operation<S, O>, BuildError> {
        if self.name.trim().is_empty() {
            return Err(BuildError::EmptyName);
        }
        if self.outcomes.is_empty() {
            return Err(BuildError::EmptyOutcomeSpace(self.name));
        }
        let next = self
            .next
            .ok_or_else(|| BuildError::MissingPostcondition(self.name.clone()))?;

        Ok(Operation {
            name: self.name,
            precondition: self.precondition.unwrap_or_else(Guard::always),
            outcomes: self.outcomes,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_enum;

    state_enum! {
        enum Handle {
            Closed,
            ReadOpen,
            WriteOpen,
        }
    }

    #[test]
    fn builder_requires_outcomes() {
        let result = OperationBuilder::<Handle, bool>::new("open_read")
            .moves_to(Handle::ReadOpen)
            .build();
        assert_eq!(
            result.unwrap_err(),
            BuildError::EmptyOutcomeSpace("open_read".to_string())
        );
    }

    #[test]
    fn builder_requires_postcondition() {
        let result = OperationBuilder::<Handle, bool>::new("open_read")
            .outcomes([true, false])
            .build();
        assert_eq!(
            result.unwrap_err(),
            BuildError::MissingPostcondition("open_read".to_string())
        );
    }

    #[test]
    fn missing_guard_allows_every_state() {
        let op = OperationBuilder::<Handle, ()>::new("noop")
            .outcome(())
            .next(|s, _| Some(s.clone()))
            .build()
            .unwrap();

        for state in Handle::all() {
            assert!(op.allows(&state));
        }
    }

    #[test]
    fn result_dependent_postcondition() {
        let op = OperationBuilder::<Handle, bool>::new("open_read")
            .when(|s| *s == Handle::Closed)
            .outcomes([true, false, true])
            .next(|_, opened| Some(if *opened { Handle::ReadOpen } else { Handle::Closed }))
            .build()
            .unwrap();

        assert_eq!(op.outcomes(), &[true, false]);
        assert!(op.allows(&Handle::Closed));
        assert!(!op.allows(&Handle::WriteOpen));
        assert_eq!(op.next_state(&Handle::Closed, &true), Some(Handle::ReadOpen));
        assert_eq!(op.next_state(&Handle::Closed, &false), Some(Handle::Closed));
        assert!(op.declares(&false));
    }
}
