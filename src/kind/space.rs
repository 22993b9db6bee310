//! State spaces: the set of states a kind may ever occupy.

use crate::core::{Guard, State};

/// The declared state space of a resource kind.
///
/// A `Finite` space lists every state and lets totality be checked over all
/// of them. An `Indexed` space describes a parametrized family (a buffer of
/// any length, a game with any number of guesses left) by a membership
/// predicate; totality is then checked over the states reachable from the
/// kind's initial state.
#[derive(Clone, Debug)]
pub enum StateSpace<S: State> {
    Finite(Vec<S>),
    Indexed(Guard<S>),
}

impl<S: State> StateSpace<S> {
    pub fn finite<I>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        let mut unique: Vec<S> = Vec::new();
        for state in states {
            if !unique.contains(&state) {
                unique.push(state);
            }
        }
        StateSpace::Finite(unique)
    }

    pub fn indexed<F>(membership: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        StateSpace::Indexed(Guard::new(membership))
    }

    /// Whether `state` belongs to the space.
    pub fn contains(&self, state: &S) -> bool {
        match self {
            StateSpace::Finite(states) => states.contains(state),
            StateSpace::Indexed(membership) => membership.check(state),
        }
    }

    /// Every state of a finite space; `None` for indexed families.
    pub fn states(&self) -> Option<&[S]> {
        match self {
            StateSpace::Finite(states) => Some(states),
            StateSpace::Indexed(_) => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, StateSpace::Finite(_))
    }
}
