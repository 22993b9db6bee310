//! Guard predicates used as operation preconditions.
//!
//! A guard is a pure boolean function over a state. The checker evaluates an
//! operation's guard before running its action; a guard that rejects the
//! current state blocks the invocation outright.

use super::state::State;
use std::fmt;
use std::sync::Arc;

/// Pure predicate over a state.
///
/// Guards are cheap to clone (the predicate is shared) so that kind
/// definitions can be snapshotted into every instance.
///
/// # Example
///
/// ```rust
/// use tenet::core::{Guard, State};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Handle {
///     Closed,
///     Open,
/// }
///
/// impl State for Handle {
///     fn name(&self) -> &str {
///         match self {
///             Self::Closed => "Closed",
///             Self::Open => "Open",
///         }
///     }
/// }
///
/// let must_be_open = Guard::new(|h: &Handle| matches!(h, Handle::Open));
///
/// assert!(must_be_open.check(&Handle::Open));
/// assert!(!must_be_open.check(&Handle::Closed));
/// ```
pub struct Guard<S: State> {
    predicate: Arc<dyn Fn(&S) -> bool + Send + Sync>,
}

impl<S: State> Guard<S> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Guard that accepts every state.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Guard that accepts exactly one state.
    pub fn only(state: S) -> Self
    where
        S: 'static,
    {
        Self::new(move |s| *s == state)
    }

    /// Check if the guard allows the given state.
    pub fn check(&self, state: &S) -> bool {
        (self.predicate)(state)
    }
}

impl<S: State> Clone for Guard<S> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<S: State> fmt::Debug for Guard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Closed,
        ReadOpen,
        WriteOpen,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Closed => "Closed",
                Self::ReadOpen => "ReadOpen",
                Self::WriteOpen => "WriteOpen",
            }
        }
    }

    #[test]
    fn guard_allows_matching_states() {
        let guard = Guard::new(|s: &TestState| matches!(s, TestState::Closed));

        assert!(guard.check(&TestState::Closed));
        assert!(!guard.check(&TestState::ReadOpen));
    }

    #[test]
    fn always_accepts_everything() {
        let guard = Guard::<TestState>::always();

        assert!(guard.check(&TestState::Closed));
        assert!(guard.check(&TestState::ReadOpen));
        assert!(guard.check(&TestState::WriteOpen));
    }

    #[test]
    fn only_accepts_one_state() {
        let guard = Guard::only(TestState::WriteOpen);

        assert!(guard.check(&TestState::WriteOpen));
        assert!(!guard.check(&TestState::ReadOpen));
    }

    #[test]
    fn cloned_guard_shares_predicate() {
        let guard = Guard::new(|s: &TestState| *s != TestState::Closed);
        let cloned = guard.clone();

        for state in [TestState::Closed, TestState::ReadOpen, TestState::WriteOpen] {
            assert_eq!(guard.check(&state), cloned.check(&state));
        }
    }
}
