//! The `State` and `Outcome` traits.
//!
//! A state is one point in a resource kind's state space. It may be a plain
//! enum (`Closed`, `ReadOpen`, ...) or a member of an indexed family that
//! carries data (`Running { guesses, letters }`). An outcome is the value an
//! operation's action produces; the next state is computed from it.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for resource states.
///
/// All methods are pure. States are immutable values; the checker replaces
/// an instance's state wholesale on every committed transition.
///
/// # Required Traits
///
/// - `Clone`: states are copied into session logs and checkpoints
/// - `PartialEq`: postconditions are verified by comparing states
/// - `Debug`: states are rendered into errors and log fields
/// - `Serialize` + `Deserialize`: states are checkpointed
///
/// # Example
///
/// ```rust
/// use tenet::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Socket {
///     Idle,
///     Connected { retries: u8 },
/// }
///
/// impl State for Socket {
///     fn name(&self) -> &str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Connected { .. } => "Connected",
///         }
///     }
/// }
///
/// assert_eq!(Socket::Connected { retries: 2 }.name(), "Connected");
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    ///
    /// Indexed states return the family name, not the index.
    fn name(&self) -> &str;
}

/// Value produced by an operation's action.
///
/// Implemented for every type with the required bounds, so kinds normally
/// use a small enum of their own:
///
/// ```rust
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum DoorOutcome {
///     Opened(bool),
///     Shut,
/// }
///
/// fn assert_outcome<O: tenet::core::Outcome>() {}
/// assert_outcome::<DoorOutcome>();
/// assert_outcome::<bool>();
/// ```
pub trait Outcome:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
}

impl<T> Outcome for T where
    T: Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Closed,
        Open { depth: u32 },
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Closed => "Closed",
                Self::Open { .. } => "Open",
            }
        }
    }

    #[test]
    fn state_name_returns_correct_value() {
        assert_eq!(TestState::Closed.name(), "Closed");
        assert_eq!(TestState::Open { depth: 0 }.name(), "Open");
    }

    #[test]
    fn indexed_states_share_family_name() {
        let a = TestState::Open { depth: 1 };
        let b = TestState::Open { depth: 7 };
        assert_eq!(a.name(), b.name());
        assert_ne!(a, b);
    }

    #[test]
    fn state_serializes_correctly() {
        let state = TestState::Open { depth: 3 };
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }

    #[test]
    fn primitive_types_are_outcomes() {
        fn takes_outcome<O: Outcome>(o: O) -> O {
            o
        }
        assert!(takes_outcome(true));
        takes_outcome(());
        assert_eq!(takes_outcome(String::from("x")), "x");
    }
}
