//! Operations: protocol actions with a precondition and a result-dependent
//! postcondition.

use crate::core::{Guard, Outcome, State};
use std::fmt;
use std::sync::Arc;

/// Postcondition function: maps (entry state, outcome) to the next state.
/// `None` marks the pair as undefined.
pub type NextFn<S, O> = Arc<dyn Fn(&S, &O) -> Option<S> + Send + Sync>;

/// One protocol action registered against a kind.
///
/// The post-state is not fixed when the operation is declared: it is
/// computed from the outcome the action actually produces.
pub struct Operation<S: State, O: Outcome> {
    pub(crate) name: String,
    pub(crate) precondition: Guard<S>,
    pub(crate) outcomes: Vec<O>,
    pub(crate) next: NextFn<S, O>,
}

impl<S: State + 'static, O: Outcome + 'static> Operation<S, O> {
    /// Start building an operation with the given name.
    pub fn builder(name: impl Into<String>) -> crate::builder::OperationBuilder<S, O> {
        crate::builder::OperationBuilder::new(name)
    }
}

impl<S: State, O: Outcome> Operation<S, O> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared outcome space.
    pub fn outcomes(&self) -> &[O] {
        &self.outcomes
    }

    /// Whether the precondition holds in `state` (pure).
    pub fn allows(&self, state: &S) -> bool {
        self.precondition.check(state)
    }

    /// Whether `outcome` belongs to the declared outcome space.
    pub fn declares(&self, outcome: &O) -> bool {
        self.outcomes.contains(outcome)
    }

    /// Apply the postcondition function (pure).
    pub fn next_state(&self, state: &S, outcome: &O) -> Option<S> {
        (self.next)(state, outcome)
    }
}

impl<S: State, O: Outcome> Clone for Operation<S, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            precondition: self.precondition.clone(),
            outcomes: self.outcomes.clone(),
            next: Arc::clone(&self.next),
        }
    }
}

impl<S: State, O: Outcome> fmt::Debug for Operation<S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("outcomes", &self.outcomes)
            .finish_non_exhaustive()
    }
}
